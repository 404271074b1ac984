//! End-to-end installer tests over in-memory remotes and a real temp directory.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use common::*;
use modsync::manifest::VersionDescriptor;
use modsync::{InstallCallbacks, Installer, InstallerConfig, Strategy};

struct Fixture {
    dir: TempDir,
    manifest: Arc<ScriptedManifest>,
    storage: Arc<ScriptedStorage>,
    snapshots: Snapshots,
}

impl Fixture {
    fn new(files: Vec<modsync::manifest::RemoteFileDescriptor>) -> Self {
        Self::with_manifest(ScriptedManifest::new(files))
    }

    fn with_manifest(manifest: ScriptedManifest) -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            manifest: Arc::new(manifest),
            storage: Arc::new(ScriptedStorage::new()),
            snapshots: Snapshots::default(),
        }
    }

    fn config(&self) -> InstallerConfig {
        InstallerConfig::new(self.dir.path())
    }

    fn installer(&self, config: InstallerConfig) -> Installer {
        Installer::new(
            config,
            collaborators(&self.manifest, &self.storage),
            self.snapshots.observer(),
        )
    }
}

fn three_files() -> Vec<modsync::manifest::RemoteFileDescriptor> {
    vec![
        descriptor("Maps/a.map", 100),
        descriptor("Maps/b.map", 200),
        descriptor("Mods/c.mod", 50),
    ]
}

#[tokio::test]
async fn test_check_reports_empty_directory() {
    let fixture = Fixture::new(three_files());
    let mut installer = fixture.installer(fixture.config());

    installer.initialize().await.unwrap();

    let state = installer.state();
    assert_eq!(state.size, 350);
    assert_eq!(state.loaded, 0);
    assert!(!state.ready);
    assert!(!state.error);
    assert!(!state.initializing);
    assert_eq!(state.host, "mods.test");
    assert_eq!(state.files.len(), 3);
    for file in &state.files {
        assert!(!file.ready);
        assert_eq!(file.progress, 0.0);
        assert!(!file.is_downloading());
    }
    assert!(fixture.storage.opened().is_empty());
}

#[tokio::test]
async fn test_connect_initializes() {
    let fixture = Fixture::new(three_files());
    let installer = Installer::connect(
        fixture.config(),
        collaborators(&fixture.manifest, &fixture.storage),
        fixture.snapshots.observer(),
    )
    .await
    .unwrap();

    assert_eq!(installer.state().files.len(), 3);
    assert!(!installer.state().initializing);
    assert_eq!(fixture.manifest.listings(), 1);
    assert!(fixture.snapshots.any(|s| s.initializing));
}

#[tokio::test]
async fn test_connect_fails_without_manifest() {
    let fixture = Fixture::new(three_files());
    fixture.manifest.set_available(false);
    let result = Installer::connect(
        fixture.config(),
        collaborators(&fixture.manifest, &fixture.storage),
        fixture.snapshots.observer(),
    )
    .await;

    assert!(result.is_err());
    assert!(!fixture.snapshots.last().unwrap().initializing);
}

#[tokio::test]
async fn test_observer_sees_initializing_transitions() {
    let fixture = Fixture::new(three_files());
    let mut installer = fixture.installer(fixture.config());

    installer.initialize().await.unwrap();

    let snapshots = fixture.snapshots.all();
    assert!(snapshots.first().unwrap().initializing);
    assert!(!snapshots.last().unwrap().initializing);
    assert_eq!(snapshots.last().unwrap().files.len(), 3);
}

#[tokio::test]
async fn test_install_downloads_every_file() {
    let fixture = Fixture::new(three_files());
    let mut installer = fixture.installer(fixture.config());
    installer.initialize().await.unwrap();

    installer.install(InstallCallbacks::new()).await.unwrap();

    let state = installer.state();
    assert!(state.ready);
    assert!(!state.error);
    assert!(!state.downloading);
    assert_eq!(state.loaded, 350);
    assert_eq!(state.progress, 100.0);
    assert_eq!(state.speed, 0);

    for file in &state.files {
        assert!(file.ready);
        let written = std::fs::read(&file.local).unwrap();
        assert_eq!(written, content(&file.name, file.size));
    }

    for snapshot in fixture.snapshots.all() {
        assert_invariants(&snapshot);
    }

    // Freshly written files are newer than the remote copies
    installer.check().await.unwrap();
    assert!(installer.state().ready);
    assert!(installer.state().files.iter().all(|f| f.ready));
}

#[tokio::test]
async fn test_matching_file_is_not_transferred() {
    let fixture = Fixture::new(three_files());
    write_local(
        fixture.dir.path(),
        "Maps/a.map",
        &content("Maps/a.map", 100),
        60,
    );

    let mut installer = fixture.installer(fixture.config());
    installer.initialize().await.unwrap();

    let a = &installer.state().files[0];
    assert!(a.ready);
    assert_eq!(a.progress, 100.0);
    assert_eq!(installer.state().loaded, 100);

    installer.install(InstallCallbacks::new()).await.unwrap();

    let mut opened = fixture.storage.opened();
    opened.sort();
    assert_eq!(opened, vec!["Maps/b.map", "Mods/c.mod"]);
    assert!(installer.state().ready);
}

#[tokio::test]
async fn test_stale_or_resized_local_files_are_replaced() {
    let fixture = Fixture::new(three_files());
    // Older than the remote copy
    write_local(fixture.dir.path(), "Maps/a.map", &content("Maps/a.map", 100), -60);
    // Newer but truncated
    write_local(fixture.dir.path(), "Maps/b.map", &[0u8; 10], 60);

    let mut installer = fixture.installer(fixture.config());
    installer.initialize().await.unwrap();
    assert!(installer.state().files.iter().all(|f| !f.ready));

    installer.install(InstallCallbacks::new()).await.unwrap();

    assert_eq!(fixture.storage.opened().len(), 3);
    let b = std::fs::read(fixture.dir.path().join("Maps/b.map")).unwrap();
    assert_eq!(b, content("Maps/b.map", 200));
}

#[tokio::test]
async fn test_mid_stream_error_is_isolated() {
    let fixture = Fixture::new(three_files());
    fixture.storage.script("Maps/b.map", Script::FailAfter(70));

    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let callbacks = InstallCallbacks::new()
        .on_file_error(move |file, err| sink.lock().unwrap().push((file.name.clone(), err.to_string())));

    let mut installer = fixture.installer(fixture.config());
    installer.initialize().await.unwrap();
    installer.install(callbacks).await.unwrap();

    let state = installer.state();
    let (a, b, c) = (&state.files[0], &state.files[1], &state.files[2]);
    assert!(a.ready);
    assert!(c.ready);
    assert!(b.error);
    assert!(!b.ready);
    assert!(!b.is_downloading());
    assert!(state.error);
    assert!(!state.ready);
    assert!(!state.downloading);

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, "Maps/b.map");

    for snapshot in fixture.snapshots.all() {
        assert_invariants(&snapshot);
    }
}

#[tokio::test]
async fn test_open_failure_marks_file_error() {
    let fixture = Fixture::new(three_files());
    fixture.storage.script("Mods/c.mod", Script::FailOpen);

    let mut installer = fixture.installer(fixture.config());
    installer.initialize().await.unwrap();
    installer.install(InstallCallbacks::new()).await.unwrap();

    let state = installer.state();
    assert!(state.files[2].error);
    assert!(state.files[0].ready && state.files[1].ready);
    assert!(state.error);
    assert!(!state.ready);
}

#[tokio::test]
async fn test_retry_after_error_clears_flag() {
    let fixture = Fixture::new(three_files());
    fixture.storage.script("Maps/b.map", Script::FailAfter(10));

    let mut installer = fixture.installer(fixture.config());
    installer.initialize().await.unwrap();
    installer.install(InstallCallbacks::new()).await.unwrap();
    assert!(installer.state().error);

    // Second run: the script was consumed, so b succeeds
    installer.install(InstallCallbacks::new()).await.unwrap();
    assert!(!installer.state().error);
    assert!(installer.state().ready);
    let opened = fixture.storage.opened();
    assert_eq!(opened.len(), 4);
    assert_eq!(opened.iter().filter(|p| *p == "Maps/b.map").count(), 2);
}

#[tokio::test]
async fn test_queue_runs_one_transfer_at_a_time() {
    let fixture = Fixture::new(three_files());
    let mut installer = fixture.installer(fixture.config().with_strategy(Strategy::Queue));
    installer.initialize().await.unwrap();

    installer.install(InstallCallbacks::new()).await.unwrap();

    assert_eq!(fixture.storage.peak(), 1);
    assert_eq!(
        fixture.storage.opened(),
        vec!["Maps/a.map", "Maps/b.map", "Mods/c.mod"]
    );
    assert!(installer.state().ready);
    assert!(fixture
        .snapshots
        .all()
        .iter()
        .all(|s| s.active_transfers() <= 1));
}

#[tokio::test]
async fn test_parallel_starts_every_file_before_any_finishes() {
    let fixture = Fixture::new(three_files());
    let gates: Vec<Gate> = three_files()
        .iter()
        .map(|f| fixture.storage.gate(&f.path))
        .collect();

    let mut installer = fixture.installer(fixture.config().with_strategy(Strategy::Parallel));
    installer.initialize().await.unwrap();

    let storage = Arc::clone(&fixture.storage);
    let driver = async move {
        wait_until("all streams open", || storage.open_now() == 3).await;
        for (gate, file) in gates.into_iter().zip(three_files()) {
            gate.send(content(&file.path, file.size));
            gate.close();
        }
    };

    let (result, ()) = tokio::join!(installer.install(InstallCallbacks::new()), driver);
    result.unwrap();

    assert_eq!(fixture.storage.peak(), 3);
    assert!(installer.state().ready);
    assert!(fixture.snapshots.any(|s| s.active_transfers() == 3));
}

#[tokio::test]
async fn test_cancel_mid_transfer() {
    let fixture = Fixture::new(vec![descriptor("Maps/a.map", 100), descriptor("Maps/b.map", 200)]);
    let gate_a = fixture.storage.gate("Maps/a.map");
    let gate_b = fixture.storage.gate("Maps/b.map");

    let errors = Arc::new(AtomicUsize::new(0));
    let error_count = Arc::clone(&errors);
    let callbacks = InstallCallbacks::new().on_file_error(move |_, _| {
        error_count.fetch_add(1, Ordering::SeqCst);
    });

    let mut installer = fixture.installer(fixture.config());
    installer.initialize().await.unwrap();
    let canceller = installer.canceller();

    let storage = Arc::clone(&fixture.storage);
    let snapshots = fixture.snapshots.clone();
    let driver = async move {
        wait_until("both streams open", || storage.open_now() == 2).await;
        gate_a.send(content("Maps/a.map", 100)[..40].to_vec());
        wait_until("first chunk accounted", || snapshots.any(|s| s.loaded == 40)).await;

        canceller.cancel();
        wait_until("streams released", || storage.open_now() == 0).await;

        // Late data goes nowhere
        gate_a.send(vec![0; 60]);
        gate_b.send(vec![0; 200]);
    };

    let (result, ()) = tokio::join!(installer.install(callbacks), driver);
    result.unwrap();

    let state = installer.state();
    assert!(!state.downloading);
    assert!(!state.ready);
    assert!(!state.error);
    assert_eq!(state.speed, 0);
    assert_eq!(state.loaded, 40);
    for file in &state.files {
        assert!(!file.ready);
        assert!(!file.error);
        assert!(!file.is_downloading());
    }
    assert_eq!(errors.load(Ordering::SeqCst), 0);
    assert_eq!(fixture.storage.open_now(), 0);

    // Partial files on disk are not mistaken for complete ones
    let state = installer.check().await.unwrap();
    assert!(!state.files[0].ready);
    assert!(!state.files[1].ready);
    assert_eq!(state.loaded, 0);
    assert!(!state.ready);
}

#[tokio::test]
async fn test_cancel_skips_queued_files() {
    let fixture = Fixture::new(three_files());
    let _gate = fixture.storage.gate("Maps/a.map");

    let mut installer = fixture.installer(fixture.config().with_strategy(Strategy::Queue));
    installer.initialize().await.unwrap();
    let canceller = installer.canceller();

    let storage = Arc::clone(&fixture.storage);
    let driver = async move {
        wait_until("first stream open", || storage.open_now() == 1).await;
        canceller.cancel();
    };

    let (result, ()) = tokio::join!(installer.install(InstallCallbacks::new()), driver);
    result.unwrap();

    assert_eq!(fixture.storage.opened(), vec!["Maps/a.map"]);
    assert!(!installer.state().downloading);
    assert!(installer.state().files.iter().all(|f| !f.ready && !f.error));
}

#[tokio::test]
async fn test_cancel_before_install_is_ignored() {
    let fixture = Fixture::new(three_files());
    let mut installer = fixture.installer(fixture.config());
    installer.initialize().await.unwrap();

    installer.canceller().cancel();
    installer.install(InstallCallbacks::new()).await.unwrap();

    assert!(installer.state().ready);
}

#[tokio::test]
async fn test_cancel_while_install_reconciles() {
    let fixture = Fixture::new(three_files());
    let slot: Arc<Mutex<Option<modsync::Canceller>>> = Arc::new(Mutex::new(None));
    let armed = Arc::clone(&slot);
    let mut observer = fixture.snapshots.observer();
    let mut installer = Installer::new(
        fixture.config(),
        collaborators(&fixture.manifest, &fixture.storage),
        move |state: &modsync::InstallerState| {
            if state.initializing {
                if let Some(canceller) = armed.lock().unwrap().take() {
                    canceller.cancel();
                }
            }
            observer(state);
        },
    );
    installer.initialize().await.unwrap();
    *slot.lock().unwrap() = Some(installer.canceller());

    installer.install(InstallCallbacks::new()).await.unwrap();

    assert!(slot.lock().unwrap().is_none());
    assert!(fixture.storage.opened().is_empty());
    assert!(!fixture.snapshots.any(|s| s.downloading));
    let state = installer.state();
    assert!(!state.ready);
    assert!(!state.initializing);
    assert!(state.files.iter().all(|f| !f.ready && !f.error));

    // The request is consumed; the next install runs normally
    installer.install(InstallCallbacks::new()).await.unwrap();
    assert!(installer.state().ready);
    assert_eq!(fixture.storage.opened().len(), 3);
}

#[tokio::test]
async fn test_callbacks_are_invoked_in_order() {
    let fixture = Fixture::new(three_files());
    let events = Arc::new(Mutex::new(Vec::new()));

    let begin = Arc::clone(&events);
    let done = Arc::clone(&events);
    let complete = Arc::clone(&events);
    let callbacks = InstallCallbacks::new()
        .on_begin(move |state| {
            assert!(state.downloading);
            begin.lock().unwrap().push("begin".to_string());
        })
        .on_file_complete(move |file| done.lock().unwrap().push(file.name.clone()))
        .on_complete(move |state| {
            assert!(!state.downloading);
            assert!(state.ready);
            complete.lock().unwrap().push("complete".to_string());
        });

    let mut installer = fixture.installer(fixture.config().with_strategy(Strategy::Queue));
    installer.initialize().await.unwrap();
    installer.install(callbacks).await.unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec!["begin", "Maps/a.map", "Maps/b.map", "Mods/c.mod", "complete"]
    );
}

#[tokio::test]
async fn test_throughput_is_sampled() {
    let fixture = Fixture::new(vec![descriptor("Maps/a.map", 1000)]);
    let gate = fixture.storage.gate("Maps/a.map");

    let config = fixture
        .config()
        .with_sample_interval(Duration::from_millis(20));
    let mut installer = fixture.installer(config);
    installer.initialize().await.unwrap();

    let storage = Arc::clone(&fixture.storage);
    let snapshots = fixture.snapshots.clone();
    let driver = async move {
        wait_until("stream open", || storage.open_now() == 1).await;
        let data = content("Maps/a.map", 1000);
        gate.send(data[..500].to_vec());
        wait_until("speed sampled", || snapshots.any(|s| s.speed == 500)).await;
        gate.send(data[500..].to_vec());
    };

    let (result, ()) = tokio::join!(installer.install(InstallCallbacks::new()), driver);
    result.unwrap();

    assert!(fixture
        .snapshots
        .any(|s| s.files[0].speed() == 500 && s.files[0].is_downloading()));
    assert_eq!(installer.state().speed, 0);
    assert!(installer.state().ready);
}

#[tokio::test]
async fn test_manifest_outage_keeps_previous_state() {
    let fixture = Fixture::new(three_files());
    let mut installer = fixture.installer(fixture.config());
    installer.initialize().await.unwrap();
    let before = installer.state().files.clone();

    fixture.manifest.set_available(false);
    assert!(installer.check().await.is_err());

    let state = installer.state();
    assert!(!state.initializing);
    assert_eq!(state.files, before);
    assert_eq!(state.size, 350);

    let err = installer.install(InstallCallbacks::new()).await.unwrap_err();
    assert!(err.to_string().contains("scripted outage"));
    assert!(fixture.storage.opened().is_empty());
}

#[tokio::test]
async fn test_initialize_fails_without_manifest() {
    let fixture = Fixture::new(three_files());
    fixture.manifest.set_available(false);

    let mut installer = fixture.installer(fixture.config());
    assert!(installer.initialize().await.is_err());

    let last = fixture.snapshots.last().unwrap();
    assert!(!last.initializing);
    assert!(last.files.is_empty());
}

#[tokio::test]
async fn test_install_reconciles_first() {
    let fixture = Fixture::new(three_files());
    let mut installer = fixture.installer(fixture.config());
    installer.initialize().await.unwrap();
    let listings = fixture.manifest.listings();

    installer.install(InstallCallbacks::new()).await.unwrap();

    assert_eq!(fixture.manifest.listings(), listings + 1);
}

fn versioned_manifest() -> ScriptedManifest {
    ScriptedManifest::with_versions(
        vec![
            VersionDescriptor::new("1", "Base1"),
            VersionDescriptor::new("2", "Base2"),
        ],
        vec![
            descriptor("Maps/a.map", 10),
            descriptor("Versions/Base1/game.bin", 20),
            descriptor("Versions/Base2/game.bin", 30),
        ],
    )
}

#[tokio::test]
async fn test_without_version_only_shared_files_are_in_scope() {
    let fixture = Fixture::with_manifest(versioned_manifest());
    let mut installer = fixture.installer(fixture.config());
    installer.initialize().await.unwrap();

    let names: Vec<_> = installer.state().files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Maps/a.map"]);
    assert_eq!(installer.state().versions.len(), 2);
}

#[tokio::test]
async fn test_set_version_rescopes_files() {
    let fixture = Fixture::with_manifest(versioned_manifest());
    let mut installer = fixture.installer(fixture.config().with_version("1"));
    installer.initialize().await.unwrap();
    assert_eq!(installer.state().size, 30);

    installer.set_version(Some("2")).await.unwrap();
    let names: Vec<_> = installer.state().files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Maps/a.map", "Versions/Base2/game.bin"]);
    assert_eq!(installer.state().version.as_deref(), Some("2"));
    assert_eq!(installer.state().size, 40);

    installer.set_version(Some("unknown")).await.unwrap();
    assert_eq!(installer.state().files.len(), 1);

    installer.set_version(None).await.unwrap();
    assert_eq!(installer.state().files.len(), 1);
}

#[tokio::test]
async fn test_set_directory_reconciles_new_root() {
    let fixture = Fixture::new(three_files());
    let mut installer = fixture.installer(fixture.config());
    installer.initialize().await.unwrap();
    installer.install(InstallCallbacks::new()).await.unwrap();
    assert!(installer.state().ready);

    let other = TempDir::new().unwrap();
    installer.set_directory(other.path()).await.unwrap();

    let state = installer.state();
    assert_eq!(state.directory, other.path());
    assert!(!state.ready);
    assert_eq!(state.loaded, 0);
    assert!(state.files.iter().all(|f| f.local.starts_with(other.path())));
}

#[tokio::test]
async fn test_empty_manifest_is_ready() {
    let fixture = Fixture::new(Vec::new());
    let mut installer = fixture.installer(fixture.config());
    installer.initialize().await.unwrap();

    assert!(installer.state().ready);
    assert_eq!(installer.state().progress, 100.0);

    installer.install(InstallCallbacks::new()).await.unwrap();
    assert!(installer.state().ready);
    assert!(!installer.state().downloading);
}

#[tokio::test]
async fn test_zero_byte_file_is_created() {
    let fixture = Fixture::new(vec![descriptor("Mods/empty.txt", 0)]);
    let mut installer = fixture.installer(fixture.config());
    installer.initialize().await.unwrap();
    assert!(!installer.state().ready);

    installer.install(InstallCallbacks::new()).await.unwrap();

    assert!(installer.state().ready);
    assert_eq!(installer.state().files[0].progress, 100.0);
    assert!(fixture.dir.path().join("Mods/empty.txt").is_file());
}

#[tokio::test]
async fn test_unsafe_manifest_paths_are_skipped() {
    let fixture = Fixture::new(vec![
        descriptor("Maps/a.map", 10),
        descriptor("../outside.bin", 10),
    ]);
    let mut installer = fixture.installer(fixture.config());
    installer.initialize().await.unwrap();

    assert_eq!(installer.state().files.len(), 1);
    installer.install(InstallCallbacks::new()).await.unwrap();
    assert_eq!(fixture.storage.opened(), vec!["Maps/a.map"]);
}

#[derive(Default)]
struct RecordingLauncher(Mutex<Vec<String>>);

impl modsync::launch::AppLauncher for RecordingLauncher {
    fn launch(&self, target: &str) -> modsync::launch::LaunchResult<()> {
        self.0.lock().unwrap().push(target.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_launch_uses_configured_target() {
    let fixture = Fixture::new(Vec::new());
    let launcher = Arc::new(RecordingLauncher::default());

    let installer = fixture
        .installer(fixture.config().with_launch_target("battlenet://SC2"))
        .with_launcher(launcher.clone());
    installer.launch().unwrap();
    assert_eq!(*launcher.0.lock().unwrap(), vec!["battlenet://SC2"]);

    let without_target = fixture
        .installer(fixture.config())
        .with_launcher(launcher.clone());
    assert!(matches!(
        without_target.launch(),
        Err(modsync::launch::LaunchError::NoTarget)
    ));
}
