//! Audit rule synchronization

use std::path::{Path, PathBuf};
use std::sync::Arc;

use auditd_host::{FileSpec, FileStore, RuleLoader};
use tracing::{error, info, instrument};

use crate::error::SyncFailure;

/// Copies the packaged rule files into the daemon's rule directory and
/// reloads them once.
pub struct RuleSynchronizer {
    store: Arc<dyn FileStore>,
    loader: Arc<dyn RuleLoader>,
    rules_dir: PathBuf,
    file_spec: FileSpec,
}

impl RuleSynchronizer {
    /// Rule files are readable by their owner only
    pub const RULE_FILE_MODE: u32 = 0o600;

    pub fn new(
        store: Arc<dyn FileStore>,
        loader: Arc<dyn RuleLoader>,
        rules_dir: impl Into<PathBuf>,
        owner: Option<String>,
    ) -> Self {
        Self {
            store,
            loader,
            rules_dir: rules_dir.into(),
            file_spec: FileSpec {
                mode: Self::RULE_FILE_MODE,
                owner,
            },
        }
    }

    /// Copy every file directly under `source_dir`, then reload once.
    ///
    /// Returns the number of files copied.
    ///
    /// # Errors
    /// `SyncFailure::List` or `SyncFailure::Copy` stop before the reload.
    /// `SyncFailure::Reload` is returned after all copies succeeded; the
    /// copies are kept.
    #[instrument(skip(self), fields(rules_dir = %self.rules_dir.display()))]
    pub async fn sync(&self, source_dir: &Path) -> Result<usize, SyncFailure> {
        let files = self
            .store
            .list_files(source_dir)
            .map_err(|e| SyncFailure::List {
                path: source_dir.to_path_buf(),
                message: e.to_string(),
            })?;

        for file in &files {
            self.copy(file)?;
        }

        info!(count = files.len(), "installing audit rules");
        if let Err(cause) = self.loader.reload().await {
            error!(error = %cause, "failed to reload audit rules");
            return Err(SyncFailure::Reload {
                copied: files.len(),
                cause,
            });
        }

        Ok(files.len())
    }

    fn copy(&self, source: &Path) -> Result<(), SyncFailure> {
        let copy_err = |message: String| SyncFailure::Copy {
            file: source.to_path_buf(),
            message,
        };

        let name = source
            .file_name()
            .ok_or_else(|| copy_err("not a file name".to_string()))?;
        let destination = self.rules_dir.join(name);

        let content = self
            .store
            .read_bytes(source)
            .map_err(|e| copy_err(e.to_string()))?;

        info!(destination = %destination.display(), "writing audit rule");
        self.store
            .write(&destination, &content, &self.file_spec)
            .map_err(|e| copy_err(e.to_string()))
    }
}
