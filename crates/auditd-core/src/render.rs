//! Rendering `auditd.conf` from a validated configuration

use std::path::Path;

use tera::{Context, Tera};

use crate::config::AuditdConfig;
use crate::error::RenderFailure;

/// Template name inside the template directory
pub const CONFIG_TEMPLATE: &str = "auditd.conf.tera";

/// Template compiled into the binary, used when no template directory is configured
const EMBEDDED_TEMPLATE: &str = include_str!("../templates/auditd.conf.tera");

/// Turns a configuration into the literal daemon configuration file.
///
/// Implementations must be deterministic: the same configuration always
/// renders to the same bytes, otherwise every reconciliation would rewrite
/// the file and restart the daemon.
pub trait TemplateRenderer: Send + Sync {
    /// # Errors
    /// Returns `RenderFailure` if the template references a variable the
    /// configuration does not provide.
    fn render(&self, config: &AuditdConfig) -> Result<String, RenderFailure>;
}

/// Tera-backed renderer
///
/// Tera rejects undefined variables, which gives the strict-undefined
/// behaviour required for the config template.
#[derive(Debug)]
pub struct TeraRenderer {
    tera: Tera,
    template: String,
}

impl TeraRenderer {
    /// Load [`CONFIG_TEMPLATE`] from a template directory
    ///
    /// # Errors
    /// Returns `RenderFailure` if the file is missing or does not parse
    pub fn from_dir(dir: &Path) -> Result<Self, RenderFailure> {
        let path = dir.join(CONFIG_TEMPLATE);
        let mut tera = Tera::default();
        tera.add_template_file(&path, Some(CONFIG_TEMPLATE))
            .map_err(|e| failure(&path.display().to_string(), &e))?;
        Ok(Self::with_engine(tera, CONFIG_TEMPLATE))
    }

    /// Use the template shipped inside the binary
    ///
    /// # Errors
    /// Returns `RenderFailure` if the embedded template does not parse
    pub fn embedded() -> Result<Self, RenderFailure> {
        Self::from_raw(CONFIG_TEMPLATE, EMBEDDED_TEMPLATE)
    }

    /// Build a renderer from template source
    ///
    /// # Errors
    /// Returns `RenderFailure` if the source does not parse
    pub fn from_raw(name: &str, source: &str) -> Result<Self, RenderFailure> {
        let mut tera = Tera::default();
        tera.add_raw_template(name, source)
            .map_err(|e| failure(name, &e))?;
        Ok(Self::with_engine(tera, name))
    }

    fn with_engine(mut tera: Tera, template: &str) -> Self {
        // Config files are not HTML
        tera.autoescape_on(Vec::new());
        Self {
            tera,
            template: template.to_string(),
        }
    }
}

impl TemplateRenderer for TeraRenderer {
    fn render(&self, config: &AuditdConfig) -> Result<String, RenderFailure> {
        let context = Context::from_serialize(config).map_err(|e| failure(&self.template, &e))?;
        self.tera
            .render(&self.template, &context)
            .map_err(|e| failure(&self.template, &e))
    }
}

/// Tera's top-level message rarely names the cause, so keep the whole chain
fn failure(template: &str, err: &tera::Error) -> RenderFailure {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    RenderFailure {
        template: template.to_string(),
        message,
    }
}
