//! The installer engine: public operations over the state broadcaster.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use super::broadcast::{Broadcaster, Observer};
use super::callbacks::InstallCallbacks;
use super::cancel::{Canceller, ControlChannel};
use super::config::InstallerConfig;
use super::error::InstallerResult;
use super::reconcile::Reconciler;
use super::state::InstallerState;
use super::strategy::Strategy;
use super::transfer::TransferOrchestrator;
use crate::launch::{AppLauncher, LaunchError, LaunchResult, SystemLauncher};
use crate::local::{FileProber, FileWriter, LocalFs};
use crate::manifest::{ManifestSource, RemoteFileDescriptor, VersionDescriptor};
use crate::remote::RemoteStorage;

/// External services the installer depends on.
#[derive(Clone)]
pub struct Collaborators {
    /// Remote manifest listing.
    pub manifest: Arc<dyn ManifestSource>,
    /// Remote file contents.
    pub storage: Arc<dyn RemoteStorage>,
    /// Local file inspection.
    pub prober: Arc<dyn FileProber>,
    /// Local file creation.
    pub writer: Arc<dyn FileWriter>,
}

impl Collaborators {
    /// Collaborators backed by the local filesystem.
    pub fn with_local_fs(
        manifest: Arc<dyn ManifestSource>,
        storage: Arc<dyn RemoteStorage>,
    ) -> Self {
        let local = Arc::new(LocalFs::new());
        Self {
            manifest,
            storage,
            prober: local.clone(),
            writer: local,
        }
    }
}

/// Keeps a local installation in sync with the remote manifest.
///
/// Every operation that changes [`InstallerState`] notifies the observer
/// passed to [`Installer::new`]. Operations take `&mut self`, so at most one
/// runs at a time; use a [`Canceller`] to stop a running install from
/// elsewhere.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use modsync::installer::Collaborators;
/// use modsync::manifest::HttpManifestSource;
/// use modsync::remote::HttpStorage;
/// use modsync::{InstallCallbacks, Installer, InstallerConfig};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let manifest = HttpManifestSource::new("https://mods.example.com/manifest", Duration::from_secs(30))?;
/// let storage = HttpStorage::new("https://mods.example.com/files", Duration::from_secs(30))?;
/// let collaborators = Collaborators::with_local_fs(Arc::new(manifest), Arc::new(storage));
///
/// let mut installer = Installer::connect(InstallerConfig::new("/games/sc2"), collaborators, |state| {
///     println!("{:.1}%", state.progress);
/// })
/// .await?;
/// installer.install(InstallCallbacks::new()).await?;
/// # Ok(())
/// # }
/// ```
pub struct Installer {
    config: InstallerConfig,
    manifest: Arc<dyn ManifestSource>,
    storage: Arc<dyn RemoteStorage>,
    writer: Arc<dyn FileWriter>,
    reconciler: Reconciler,
    launcher: Arc<dyn AppLauncher>,
    broadcaster: Broadcaster,
    /// In-scope descriptors from the last reconciliation, aligned with
    /// `state.files`.
    scoped: Vec<RemoteFileDescriptor>,
    control: ControlChannel,
}

impl Installer {
    /// Create an installer.
    ///
    /// The observer is not called until the first operation runs; call
    /// [`initialize`](Self::initialize) once before anything else, or use
    /// [`connect`](Self::connect). Constructing first lets a caller take a
    /// [`Canceller`] before initialization starts.
    pub fn new(
        config: InstallerConfig,
        collaborators: Collaborators,
        observer: impl FnMut(&InstallerState) + Send + 'static,
    ) -> Self {
        let Collaborators {
            manifest,
            storage,
            prober,
            writer,
        } = collaborators;

        let observer: Observer = Box::new(observer);
        let mut broadcaster = Broadcaster::new(observer);
        let state = broadcaster.state_mut();
        state.directory = config.directory.clone();
        state.version = config.version.clone();
        state.host = config.host.clone().unwrap_or_else(|| manifest.host());

        Self {
            reconciler: Reconciler::new(Arc::clone(&manifest), prober),
            config,
            manifest,
            storage,
            writer,
            launcher: Arc::new(SystemLauncher::new()),
            broadcaster,
            scoped: Vec::new(),
            control: ControlChannel::new(),
        }
    }

    /// Create an installer and run [`initialize`](Self::initialize) to
    /// completion before returning it.
    pub async fn connect(
        config: InstallerConfig,
        collaborators: Collaborators,
        observer: impl FnMut(&InstallerState) + Send + 'static,
    ) -> InstallerResult<Self> {
        let mut installer = Self::new(config, collaborators, observer);
        installer.initialize().await?;
        Ok(installer)
    }

    /// Replace the application launcher.
    pub fn with_launcher(mut self, launcher: Arc<dyn AppLauncher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Current state.
    pub fn state(&self) -> &InstallerState {
        self.broadcaster.state()
    }

    /// Current settings.
    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// Handle for cancelling a running install.
    pub fn canceller(&self) -> Canceller {
        self.control.canceller()
    }

    /// Load the version list, then reconcile the local tree.
    ///
    /// If the manifest is unavailable the previous state is kept,
    /// `initializing` is cleared, and the error is returned.
    pub async fn initialize(&mut self) -> InstallerResult<()> {
        info!(
            directory = %self.config.directory.display(),
            host = %self.broadcaster.state().host,
            "Initializing installer"
        );
        self.broadcaster.update(|s| s.initializing = true);

        let versions = match self.manifest.list_versions().await {
            Ok(versions) => versions,
            Err(e) => {
                warn!(error = %e, "Failed to list versions");
                self.broadcaster.update(|s| s.initializing = false);
                return Err(e.into());
            }
        };
        self.broadcaster.update(|s| s.versions = versions);

        self.refresh().await
    }

    /// Re-run reconciliation and return the refreshed state.
    pub async fn check(&mut self) -> InstallerResult<&InstallerState> {
        self.refresh().await?;
        Ok(self.broadcaster.state())
    }

    /// Switch the installation root and reconcile it.
    pub async fn set_directory(&mut self, directory: impl Into<PathBuf>) -> InstallerResult<()> {
        let directory = directory.into();
        info!(directory = %directory.display(), "Installation directory changed");
        self.config.directory = directory.clone();
        self.broadcaster.update(|s| s.directory = directory);
        self.refresh().await
    }

    /// Select a version (or none) and reconcile.
    ///
    /// An identifier the manifest does not offer selects no version; only
    /// shared files are then in scope.
    pub async fn set_version(&mut self, version: Option<&str>) -> InstallerResult<()> {
        let version = version.map(str::to_string);
        info!(version = ?version, "Version changed");
        self.config.version = version.clone();
        self.broadcaster.update(|s| s.version = version);
        self.refresh().await
    }

    /// Change the scheduling strategy used by subsequent installs.
    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.config.strategy = strategy;
    }

    /// Bring every in-scope file up to date.
    ///
    /// Reconciles first, then transfers the files that are not ready. Returns
    /// once every transfer has settled; per-file failures are recorded in the
    /// state and reported through `callbacks`, not returned. A cancellation
    /// received during the reconcile returns without starting any transfer.
    pub async fn install(&mut self, mut callbacks: InstallCallbacks) -> InstallerResult<()> {
        let stale = self.control.drain_stale();
        if stale > 0 {
            warn!(stale, "Discarding cancellation requested before install");
        }

        self.refresh().await?;

        if self.control.take_cancel() {
            info!("Install cancelled before any transfer started");
            return Ok(());
        }

        info!(
            strategy = %self.config.strategy,
            pending = self.broadcaster.state().pending_files().count(),
            "Install started"
        );
        self.broadcaster.update(|s| s.downloading = true);
        callbacks.begin(self.broadcaster.state());

        let orchestrator = TransferOrchestrator::new(
            Arc::clone(&self.storage),
            Arc::clone(&self.writer),
            self.config.strategy,
        )
        .with_sample_interval(self.config.sample_interval);

        orchestrator
            .run(
                &self.scoped,
                &mut self.broadcaster,
                &mut callbacks,
                &mut self.control,
            )
            .await;
        Ok(())
    }

    /// Launch the installed application.
    pub fn launch(&self) -> LaunchResult<()> {
        let target = self
            .config
            .launch_target
            .as_deref()
            .ok_or(LaunchError::NoTarget)?;
        self.launcher.launch(target)
    }

    /// Reconcile with `initializing` raised for the duration.
    async fn refresh(&mut self) -> InstallerResult<()> {
        self.broadcaster.update(|s| s.initializing = true);
        let result = self.reconcile().await;
        self.broadcaster.update(|s| s.initializing = false);
        result
    }

    async fn reconcile(&mut self) -> InstallerResult<()> {
        let version = self.resolve_version();
        let result = self
            .reconciler
            .check(&self.config.directory, version.as_ref())
            .await?;

        result.apply(self.broadcaster.state_mut());
        self.scoped = result.files;
        Ok(())
    }

    fn resolve_version(&self) -> Option<VersionDescriptor> {
        let state = self.broadcaster.state();
        let selected = state.selected_version().cloned();
        if selected.is_none() {
            if let Some(id) = state.version.as_deref() {
                warn!(version = %id, "Selected version is not offered by the manifest");
            }
        }
        selected
    }
}

impl std::fmt::Debug for Installer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installer")
            .field("config", &self.config)
            .field("state", self.broadcaster.state())
            .finish_non_exhaustive()
    }
}
