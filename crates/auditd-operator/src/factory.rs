//! Wiring of the real host collaborators

use std::sync::Arc;
use std::time::Duration;

use auditd_core::{
    FanoutReporter, JsonFileReporter, Reconciler, RuleSynchronizer, ServiceController,
    StatusReporter, TemplateRenderer, TeraRenderer, TracingReporter,
};
use auditd_exec::{CommandExecutor, LocalExecutor};
use auditd_host::{
    AptManager, AugenrulesLoader, CommandSettings, FileStore, HostFs, SystemctlManager,
    SystemdDetectVirt,
};
use eyre::Result;
use tracing::info;

use crate::config::Settings;

/// Build a reconciler for the local host from settings
///
/// # Errors
/// Returns error if the config template cannot be loaded
pub fn build_reconciler(settings: &Settings) -> Result<Reconciler> {
    let executor: Arc<dyn CommandExecutor> = Arc::new(LocalExecutor::new());
    let commands = CommandSettings::new(Duration::from_secs(settings.commands.timeout_secs))
        .with_sudo(settings.commands.use_sudo);
    let store: Arc<dyn FileStore> = Arc::new(HostFs::new());

    let renderer: Arc<dyn TemplateRenderer> = match &settings.assets.template_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "loading config template");
            Arc::new(TeraRenderer::from_dir(dir)?)
        }
        None => Arc::new(TeraRenderer::embedded()?),
    };

    let rules = RuleSynchronizer::new(
        store.clone(),
        Arc::new(AugenrulesLoader::new(executor.clone(), commands)),
        &settings.daemon.rules_dir,
        settings.daemon.owner.clone(),
    );
    let mut packages = AptManager::new(executor.clone(), commands);
    if !settings.commands.update_cache {
        packages = packages.without_cache_update();
    }
    let service = ServiceController::new(
        settings.daemon.clone(),
        Arc::new(packages),
        Arc::new(SystemctlManager::new(executor.clone(), commands)),
        store.clone(),
        rules,
        &settings.assets.rules_source_dir,
    );

    Ok(Reconciler::new(
        renderer,
        service,
        Arc::new(SystemdDetectVirt::new(executor, commands)),
        status_reporter(settings, store),
    ))
}

fn status_reporter(settings: &Settings, store: Arc<dyn FileStore>) -> Arc<dyn StatusReporter> {
    Arc::new(
        FanoutReporter::new()
            .with(Arc::new(TracingReporter))
            .with(Arc::new(JsonFileReporter::new(store, &settings.status.file))),
    )
}
