//! Shared in-memory collaborators for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;

use modsync::installer::Collaborators;
use modsync::manifest::{
    ManifestError, ManifestResult, ManifestSource, RemoteFileDescriptor, VersionDescriptor,
};
use modsync::remote::{ByteStream, RemoteError, RemoteResult, RemoteStorage};
use modsync::{BoxFuture, InstallerState};

pub const CHUNK_SIZE: usize = 64;

/// Fixed remote modification time, well in the past.
pub fn remote_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn descriptor(path: &str, size: u64) -> RemoteFileDescriptor {
    RemoteFileDescriptor::new(format!("id-{}", path), path, size, remote_time())
}

/// Deterministic file contents.
pub fn content(path: &str, size: u64) -> Vec<u8> {
    let seed = path.bytes().fold(0u8, |acc, b| acc.wrapping_add(b));
    (0..size).map(|i| seed.wrapping_add(i as u8)).collect()
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

pub struct ScriptedManifest {
    versions: Vec<VersionDescriptor>,
    files: Mutex<Vec<RemoteFileDescriptor>>,
    available: AtomicBool,
    listings: AtomicUsize,
}

impl ScriptedManifest {
    pub fn new(files: Vec<RemoteFileDescriptor>) -> Self {
        Self::with_versions(Vec::new(), files)
    }

    pub fn with_versions(versions: Vec<VersionDescriptor>, files: Vec<RemoteFileDescriptor>) -> Self {
        Self {
            versions,
            files: Mutex::new(files),
            available: AtomicBool::new(true),
            listings: AtomicUsize::new(0),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    fn check_available(&self, url: &str) -> ManifestResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ManifestError::Unavailable {
                url: url.to_string(),
                reason: "scripted outage".to_string(),
            })
        }
    }
}

impl ManifestSource for ScriptedManifest {
    fn host(&self) -> String {
        "mods.test".to_string()
    }

    fn list_versions(&self) -> BoxFuture<'_, ManifestResult<Vec<VersionDescriptor>>> {
        Box::pin(async move {
            self.check_available("scripted://versions")?;
            Ok(self.versions.clone())
        })
    }

    fn list_files(&self) -> BoxFuture<'_, ManifestResult<Vec<RemoteFileDescriptor>>> {
        Box::pin(async move {
            self.check_available("scripted://files")?;
            self.listings.fetch_add(1, Ordering::SeqCst);
            Ok(self.files.lock().unwrap().clone())
        })
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// How the storage serves one path.
pub enum Script {
    /// Fail before any byte is sent.
    FailOpen,
    /// Send this many bytes of the file's content, then fail.
    FailAfter(u64),
    /// Send chunks pushed by the test; the stream ends when the sender drops.
    Gated(mpsc::UnboundedReceiver<Bytes>),
}

/// Handle used by a test to feed a gated stream.
pub struct Gate {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl Gate {
    pub fn send(&self, data: Vec<u8>) {
        let _ = self.tx.send(Bytes::from(data));
    }

    pub fn close(self) {}
}

struct OpenGuard(Arc<AtomicUsize>);

impl Drop for OpenGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct ScriptedStorage {
    scripts: Mutex<HashMap<String, Script>>,
    opened: Mutex<Vec<String>>,
    open_now: Arc<AtomicUsize>,
    peak: AtomicUsize,
}

impl ScriptedStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, path: &str, script: Script) {
        self.scripts.lock().unwrap().insert(path.to_string(), script);
    }

    pub fn gate(&self, path: &str) -> Gate {
        let (tx, rx) = mpsc::unbounded_channel();
        self.script(path, Script::Gated(rx));
        Gate { tx }
    }

    /// Paths in the order their streams were opened.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    /// Streams currently open.
    pub fn open_now(&self) -> usize {
        self.open_now.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously open streams.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn track<S>(&self, inner: S) -> ByteStream
    where
        S: futures::Stream<Item = RemoteResult<Bytes>> + Send + 'static,
    {
        let now = self.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let guard = OpenGuard(Arc::clone(&self.open_now));
        Box::pin(inner.map(move |item| {
            let _ = &guard;
            item
        }))
    }
}

fn chunks(data: Vec<u8>) -> Vec<RemoteResult<Bytes>> {
    data.chunks(CHUNK_SIZE)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect()
}

impl RemoteStorage for ScriptedStorage {
    fn open_stream<'a>(
        &'a self,
        file: &'a RemoteFileDescriptor,
    ) -> BoxFuture<'a, RemoteResult<ByteStream>> {
        Box::pin(async move {
            let script = self.scripts.lock().unwrap().remove(&file.path);
            let data = content(&file.path, file.size);

            let stream = match script {
                Some(Script::FailOpen) => {
                    return Err(RemoteError::Open {
                        path: file.path.clone(),
                        reason: "scripted open failure".to_string(),
                    });
                }
                Some(Script::FailAfter(bytes)) => {
                    let mut items = chunks(data[..bytes as usize].to_vec());
                    items.push(Err(RemoteError::Stream {
                        path: file.path.clone(),
                        reason: "scripted reset".to_string(),
                    }));
                    self.track(stream::iter(items))
                }
                Some(Script::Gated(rx)) => self.track(stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|chunk| (Ok(chunk), rx))
                })),
                None => self.track(stream::iter(chunks(data))),
            };

            self.opened.lock().unwrap().push(file.path.clone());
            Ok(stream)
        })
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Records every state pushed to the observer.
#[derive(Clone, Default)]
pub struct Snapshots(Arc<Mutex<Vec<InstallerState>>>);

impl Snapshots {
    pub fn observer(&self) -> impl FnMut(&InstallerState) + Send + 'static {
        let inner = Arc::clone(&self.0);
        move |state: &InstallerState| inner.lock().unwrap().push(state.clone())
    }

    pub fn all(&self) -> Vec<InstallerState> {
        self.0.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<InstallerState> {
        self.0.lock().unwrap().last().cloned()
    }

    pub fn any(&self, f: impl Fn(&InstallerState) -> bool) -> bool {
        self.0.lock().unwrap().iter().any(f)
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

pub fn collaborators(
    manifest: &Arc<ScriptedManifest>,
    storage: &Arc<ScriptedStorage>,
) -> Collaborators {
    let manifest: Arc<dyn ManifestSource> = manifest.clone();
    let storage: Arc<dyn RemoteStorage> = storage.clone();
    Collaborators::with_local_fs(manifest, storage)
}

/// Poll `condition` until it holds or the deadline passes.
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Write a local file with the given size and a modification time relative to
/// the remote one.
pub fn write_local(root: &Path, path: &str, data: &[u8], offset_secs: i64) {
    let local = root.join(path);
    std::fs::create_dir_all(local.parent().unwrap()).unwrap();
    std::fs::write(&local, data).unwrap();
    let mtime = filetime::FileTime::from_unix_time(remote_time().timestamp() + offset_secs, 0);
    filetime::set_file_mtime(&local, mtime).unwrap();
}

/// Per-snapshot invariants that must hold at every notification.
pub fn assert_invariants(state: &InstallerState) {
    assert!(
        state.loaded <= state.size,
        "aggregate loaded {} exceeds size {}",
        state.loaded,
        state.size
    );
    assert!((0.0..=100.0).contains(&state.progress));
    for file in &state.files {
        if file.ready {
            assert_eq!(file.loaded, file.size, "{} ready but not fully loaded", file.name);
            assert_eq!(file.progress, 100.0, "{} ready but progress != 100", file.name);
        }
        assert!(file.loaded <= file.size);
    }
}
