//! Mock collaborators shared by the integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use auditd_core::*;
use auditd_host::{
    FileSpec, FileStore, FsError, PackageError, PackageManager, PlatformProbe, ProbeError,
    RuleLoadError, RuleLoader, ServiceError, ServiceManager, Virtualization,
};

pub const CONFIG_FILE: &str = "/etc/audit/auditd.conf";
pub const RULES_DIR: &str = "/etc/audit/rules.d";
pub const RULES_SOURCE: &str = "/usr/share/auditd-operator/rules";

/// In-memory filesystem
#[derive(Default)]
pub struct MemoryFs {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    /// Every successful write, in order, with the mode applied
    writes: Mutex<Vec<(PathBuf, u32)>>,
    pub fail_writes: AtomicBool,
}

impl MemoryFs {
    pub fn put(&self, path: impl Into<PathBuf>, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), content.as_bytes().to_vec());
    }

    pub fn put_bytes(&self, path: impl Into<PathBuf>, content: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), content.to_vec());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(path.as_ref())
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    pub fn writes(&self) -> Vec<(PathBuf, u32)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn writes_to(&self, path: impl AsRef<Path>) -> usize {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path.as_ref())
            .count()
    }

    pub fn files_under(&self, dir: impl AsRef<Path>) -> usize {
        self.files
            .lock()
            .unwrap()
            .keys()
            .filter(|p| p.parent() == Some(dir.as_ref()))
            .count()
    }
}

impl FileStore for MemoryFs {
    fn read_optional(&self, path: &Path) -> Result<Option<Vec<u8>>, FsError> {
        Ok(self.files.lock().unwrap().get(path).cloned())
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::Read {
                path: path.to_path_buf(),
                source: io::Error::from(io::ErrorKind::NotFound),
            })
    }

    fn write(&self, path: &Path, content: &[u8], spec: &FileSpec) -> Result<(), FsError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FsError::Write {
                path: path.to_path_buf(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            });
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_vec());
        self.writes
            .lock()
            .unwrap()
            .push((path.to_path_buf(), spec.mode));
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MockPackages {
    pub adds: AtomicUsize,
    pub removes: AtomicUsize,
    pub fail: AtomicBool,
    pub installed: AtomicBool,
}

impl MockPackages {
    fn result(&self) -> Result<(), PackageError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(PackageError::LockConflict(
                "Could not get lock /var/lib/dpkg/lock-frontend".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PackageManager for MockPackages {
    async fn add_package(&self, _name: &str) -> Result<(), PackageError> {
        self.adds.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        self.installed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn remove_package(&self, _name: &str) -> Result<(), PackageError> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        self.installed.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn is_installed(&self, _name: &str) -> Result<bool, PackageError> {
        Ok(self.installed.load(Ordering::SeqCst))
    }
}

/// Service manager; a successful restart makes the service active unless
/// `stays_down` is set
#[derive(Default)]
pub struct MockServices {
    pub active: AtomicBool,
    pub fail_restart: AtomicBool,
    pub stays_down: AtomicBool,
    pub restarts: AtomicUsize,
    pub liveness_checks: AtomicUsize,
}

impl MockServices {
    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceManager for MockServices {
    async fn restart_service(&self, name: &str) -> Result<(), ServiceError> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        if self.fail_restart.load(Ordering::SeqCst) {
            return Err(ServiceError::CommandFailed {
                action: "restart".to_string(),
                service: name.to_string(),
                status: 1,
                message: "Job for auditd.service failed.".to_string(),
            });
        }
        if !self.stays_down.load(Ordering::SeqCst) {
            self.active.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn is_running(&self, _name: &str) -> Result<bool, ServiceError> {
        self.liveness_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.active.load(Ordering::SeqCst))
    }
}

/// Records how many rule files were in place at each reload
pub struct MockLoader {
    fs: Arc<MemoryFs>,
    rules_dir: PathBuf,
    reloads: Mutex<Vec<usize>>,
    pub fail: AtomicBool,
}

impl MockLoader {
    pub fn new(fs: Arc<MemoryFs>, rules_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            rules_dir: rules_dir.into(),
            reloads: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn reloads(&self) -> Vec<usize> {
        self.reloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl RuleLoader for MockLoader {
    async fn reload(&self) -> Result<(), RuleLoadError> {
        let in_place = self.fs.files_under(&self.rules_dir);
        self.reloads.lock().unwrap().push(in_place);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RuleLoadError::CommandFailed {
                status: 1,
                message: "Error sending add rule data request".to_string(),
            });
        }
        Ok(())
    }
}

pub struct MockProbe {
    kind: Mutex<String>,
    pub queries: AtomicUsize,
}

impl MockProbe {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: Mutex::new(kind.to_string()),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, kind: &str) {
        *self.kind.lock().unwrap() = kind.to_string();
    }
}

#[async_trait]
impl PlatformProbe for MockProbe {
    async fn virtualization(&self) -> Result<Virtualization, ProbeError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(Virtualization::new(self.kind.lock().unwrap().clone()))
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(LifecycleEvent, UnitStatus)>>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<(LifecycleEvent, UnitStatus)> {
        self.reports.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<UnitStatus> {
        self.reports.lock().unwrap().last().map(|(_, s)| s.clone())
    }
}

impl StatusReporter for RecordingReporter {
    fn report(&self, event: LifecycleEvent, status: &UnitStatus) -> Result<(), ReportError> {
        self.reports.lock().unwrap().push((event, status.clone()));
        Ok(())
    }
}

/// Renders a fixed text regardless of the configuration
pub struct FixedRenderer(pub String);

impl TemplateRenderer for FixedRenderer {
    fn render(&self, _config: &AuditdConfig) -> Result<String, RenderFailure> {
        Ok(self.0.clone())
    }
}

/// Reconciler collaborators, shared so tests can inspect them after a pass
pub struct Harness {
    pub fs: Arc<MemoryFs>,
    pub packages: Arc<MockPackages>,
    pub services: Arc<MockServices>,
    pub loader: Arc<MockLoader>,
    pub probe: Arc<MockProbe>,
    pub reporter: Arc<RecordingReporter>,
    renderer: Arc<dyn TemplateRenderer>,
}

impl Harness {
    /// Active daemon on a KVM guest, embedded template, three packaged rules
    pub fn new() -> Self {
        Self::with_renderer(Arc::new(TeraRenderer::embedded().unwrap()))
    }

    pub fn with_renderer(renderer: Arc<dyn TemplateRenderer>) -> Self {
        let fs = Arc::new(MemoryFs::default());
        for name in ["10-base-config.rules", "30-identity.rules", "99-finalize.rules"] {
            fs.put(Path::new(RULES_SOURCE).join(name), "-D\n");
        }

        let services = MockServices::default();
        services.active.store(true, Ordering::SeqCst);

        Self {
            loader: Arc::new(MockLoader::new(fs.clone(), RULES_DIR)),
            fs,
            packages: Arc::new(MockPackages::default()),
            services: Arc::new(services),
            probe: Arc::new(MockProbe::new("kvm")),
            reporter: Arc::new(RecordingReporter::default()),
            renderer,
        }
    }

    /// A reconciler wired to this harness' mocks
    pub fn reconciler(&self) -> Reconciler {
        let spec = DaemonSpec::default();
        let store: Arc<dyn FileStore> = self.fs.clone();
        let rules = RuleSynchronizer::new(
            store.clone(),
            self.loader.clone(),
            &spec.rules_dir,
            spec.owner.clone(),
        );
        let service = ServiceController::new(
            spec,
            self.packages.clone(),
            self.services.clone(),
            store,
            rules,
            RULES_SOURCE,
        );
        Reconciler::new(
            self.renderer.clone(),
            service,
            self.probe.clone(),
            self.reporter.clone(),
        )
    }

    pub fn config(&self) -> Option<String> {
        self.fs.get(CONFIG_FILE)
    }
}

/// Options from `(key, value)` pairs
pub fn options(pairs: &[(&str, serde_json::Value)]) -> RawOptions {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}
