//! Host filesystem access

use std::fs;
use std::io::Write;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use nix::unistd::User;
use tracing::debug;

use crate::error::FsError;
use crate::traits::FileStore;
use crate::types::FileSpec;

/// `FileStore` over the local filesystem
///
/// Writes go to a sibling temporary file which receives its mode and owner
/// before being renamed over the target, so readers never see a partial
/// file or one with loose permissions.
#[derive(Debug, Clone, Default)]
pub struct HostFs;

impl HostFs {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn resolve_owner(owner: &str) -> Result<User, FsError> {
        User::from_name(owner)
            .map_err(|source| FsError::OwnerLookup {
                owner: owner.to_string(),
                source,
            })?
            .ok_or_else(|| FsError::UnknownOwner(owner.to_string()))
    }

    fn staging_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
    }
}

impl FileStore for HostFs {
    fn read_optional(&self, path: &Path) -> Result<Option<Vec<u8>>, FsError> {
        match fs::read(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FsError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        fs::read(path).map_err(|source| FsError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write(&self, path: &Path, content: &[u8], spec: &FileSpec) -> Result<(), FsError> {
        let write_err = |source| FsError::Write {
            path: path.to_path_buf(),
            source,
        };

        // Resolve before touching the disk so an unknown owner leaves nothing behind
        let owner = spec.owner.as_deref().map(Self::resolve_owner).transpose()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let staging = Self::staging_path(path);
        // A leftover from an interrupted write may carry a looser mode
        let _ = fs::remove_file(&staging);
        let result = (|| {
            // Created with the final mode so the content is never exposed;
            // the chmod restores bits the umask removed
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .mode(spec.mode)
                .open(&staging)?;
            file.write_all(content)?;
            file.sync_all()?;
            fs::set_permissions(&staging, fs::Permissions::from_mode(spec.mode))?;
            if let Some(user) = &owner {
                std::os::unix::fs::chown(&staging, Some(user.uid.as_raw()), Some(user.gid.as_raw()))?;
            }
            fs::rename(&staging, path)
        })();

        if let Err(source) = result {
            let _ = fs::remove_file(&staging);
            return Err(write_err(source));
        }

        debug!(path = %path.display(), mode = %format!("{:o}", spec.mode), "wrote file");
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError> {
        let list_err = |source| FsError::List {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;
            if entry.file_type().map_err(list_err)?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}
