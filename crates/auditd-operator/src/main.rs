//! auditd-operator
//!
//! Keeps auditd installed, configured and running in response to lifecycle
//! events delivered on the command line.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use auditd_core::{
    Dispatch, LifecycleEvent, OperatorActor, OperatorActorArgs, OperatorError, RawOptions,
    StatusRecord,
};
use auditd_host::HostFs;
use clap::{Parser, Subcommand};
use color_eyre::Result;
use kameo::actor::Spawn;
use kameo::error::SendError;
use tracing::{error, info, warn};

mod config;
mod factory;
mod logging;

use config::Settings;

#[derive(Parser)]
#[command(name = "auditd-operator")]
#[command(about = "Lifecycle manager for the Linux audit daemon", long_about = None)]
struct Cli {
    /// Settings file (default: $AUDITD_OPERATOR_SETTINGS or the standard locations)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Daemon options file (default: /etc/auditd-operator/options.toml)
    #[arg(long, global = true)]
    options: Option<PathBuf>,

    /// Override one daemon option, e.g. --set num_logs=20
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    overrides: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle one lifecycle event
    Hook {
        /// install, upgrade, config-changed, update-status or remove
        event: LifecycleEvent,
    },
    /// Install auditd, then apply the configuration
    Deploy,
    /// Print the last reported status
    Status,
}

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// Event handled; the status may still be blocked
    Success = 0,
    /// Install, removal, rule sync or platform probe failed
    Failed = 1,
    /// The platform cannot run auditd
    Fatal = 2,
    /// Bad arguments, settings or options
    Usage = 3,
}

impl Exit {
    fn for_error(err: &OperatorError) -> Self {
        if err.is_fatal() { Exit::Fatal } else { Exit::Failed }
    }
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not errors
            let exit = if e.use_stderr() { Exit::Usage } else { Exit::Success };
            e.print()?;
            return Ok(exit.into());
        }
    };

    let settings_path = Settings::locate(cli.settings.as_deref());
    let settings = match settings_path.as_deref().map(Settings::load).transpose() {
        Ok(settings) => settings.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: {e:?}");
            return Ok(Exit::Usage.into());
        }
    };

    logging::init(&settings.logging)?;
    match &settings_path {
        Some(path) => info!(path = %path.display(), "loaded settings"),
        None => warn!("no settings file found, using defaults"),
    }

    let exit = match cli.command {
        Commands::Status => print_status(&settings)?,
        Commands::Hook { event } => {
            handle_events(&settings, cli.options.as_deref(), &cli.overrides, &[event]).await?
        }
        Commands::Deploy => {
            let events = [LifecycleEvent::Install, LifecycleEvent::ConfigChanged];
            handle_events(&settings, cli.options.as_deref(), &cli.overrides, &events).await?
        }
    };

    Ok(exit.into())
}

/// Feed events to the operator actor in order, stopping at the first failure
async fn handle_events(
    settings: &Settings,
    options_path: Option<&Path>,
    overrides: &[String],
    events: &[LifecycleEvent],
) -> Result<Exit> {
    let options: RawOptions = match config::load_options(options_path, overrides) {
        Ok(options) => options,
        Err(e) => {
            error!(error = ?e, "failed to load options");
            return Ok(Exit::Usage);
        }
    };

    let reconciler = match factory::build_reconciler(settings) {
        Ok(reconciler) => reconciler,
        Err(e) => {
            error!(error = ?e, "failed to set up operator");
            return Ok(Exit::Usage);
        }
    };

    let actor_ref = OperatorActor::spawn(OperatorActorArgs { reconciler });

    let mut exit = Exit::Success;
    for &event in events {
        match actor_ref.ask(Dispatch::new(event, options.clone())).await {
            Ok(outcome) => println!("{}", serde_json::to_string(&outcome)?),
            Err(SendError::HandlerError(e)) => {
                exit = Exit::for_error(&e);
                break;
            }
            Err(e) => {
                eyre::bail!("operator actor unavailable: {e}");
            }
        }
    }

    actor_ref
        .stop_gracefully()
        .await
        .map_err(|e| eyre::eyre!("failed to stop operator actor: {e}"))?;

    Ok(exit)
}

fn print_status(settings: &Settings) -> Result<Exit> {
    match StatusRecord::load(&HostFs::new(), &settings.status.file)? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => info!(path = %settings.status.file.display(), "no status recorded yet"),
    }
    Ok(Exit::Success)
}
