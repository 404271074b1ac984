//! Transfer orchestration.
//!
//! A single event loop owns the installer state for the duration of an
//! install. Transfer futures run concurrently inside the loop and report back
//! over a channel; the loop is the only code that mutates state.
//!
//! ```text
//!                  ┌────────────────────────────────────────┐
//!  pending queue ─►│ event loop (owns Broadcaster)          │
//!                  │                                        │
//!  transfer futs ─►│  Started / Chunk  ──► per-file account │──► observer
//!  (in flight)     │  settle outcome   ──► ready | error    │
//!  1s ticker ─────►│  tick             ──► throughput sample│
//!  Canceller ─────►│  Cancel           ──► tokens + halt    │
//!                  └────────────────────────────────────────┘
//! ```
//!
//! The strategy only bounds the number of futures in flight: `Queue` keeps one,
//! `Parallel` starts every pending file at once.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::broadcast::Broadcaster;
use super::callbacks::InstallCallbacks;
use super::cancel::{ControlChannel, ControlMessage};
use super::error::{TransferError, TransferResult};
use super::state::{ActiveTransfer, InstallerState};
use super::strategy::Strategy;
use crate::local::FileWriter;
use crate::manifest::RemoteFileDescriptor;
use crate::remote::RemoteStorage;
use crate::BoxFuture;

/// Default throughput sampling period.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Progress reported by a running transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransferEvent {
    /// Sink and stream are open.
    Started { index: usize },
    /// A chunk was written to the sink.
    Chunk { index: usize, bytes: u64 },
}

type Settled<'a> = BoxFuture<'a, (usize, TransferResult<()>)>;

/// Runs the transfers of one install.
#[derive(Clone)]
pub struct TransferOrchestrator {
    storage: Arc<dyn RemoteStorage>,
    writer: Arc<dyn FileWriter>,
    strategy: Strategy,
    sample_interval: Duration,
}

impl TransferOrchestrator {
    /// Create an orchestrator over the given collaborators.
    pub fn new(
        storage: Arc<dyn RemoteStorage>,
        writer: Arc<dyn FileWriter>,
        strategy: Strategy,
    ) -> Self {
        Self {
            storage,
            writer,
            strategy,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }

    /// Override the throughput sampling period.
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Scheduling strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Transfer every non-ready file of the current state.
    ///
    /// `files` are the in-scope descriptors aligned with `state.files`.
    /// Returns once every started transfer has settled.
    pub(crate) async fn run(
        &self,
        files: &[RemoteFileDescriptor],
        broadcaster: &mut Broadcaster,
        callbacks: &mut InstallCallbacks,
        control: &mut ControlChannel,
    ) {
        let mut pending: VecDeque<usize> = broadcaster
            .state()
            .files
            .iter()
            .zip(files)
            .enumerate()
            .filter(|(_, (status, _))| !status.ready)
            .map(|(index, _)| index)
            .collect();

        info!(
            strategy = %self.strategy,
            pending = pending.len(),
            "Starting transfers"
        );

        let limit = self.strategy.max_in_flight();
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let mut in_flight: FuturesUnordered<Settled<'_>> = FuturesUnordered::new();
        let mut registry: HashMap<usize, CancellationToken> = HashMap::new();
        let mut ledger = TransferLedger::new(broadcaster, callbacks);

        let mut ticker = time::interval_at(
            Instant::now() + self.sample_interval,
            self.sample_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            while in_flight.len() < limit {
                let Some(index) = pending.pop_front() else {
                    break;
                };
                let file = &files[index];
                let local = file_destination(ledger.state(), index, file);
                let token = CancellationToken::new();
                registry.insert(index, token.clone());
                debug!(file = %file.path, "Transfer scheduled");

                in_flight.push(Box::pin(transfer_file(
                    index,
                    file,
                    local,
                    self.storage.as_ref(),
                    self.writer.as_ref(),
                    events_tx.clone(),
                    token,
                )));
            }

            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                Some(event) = events_rx.recv() => ledger.apply(event),
                Some((index, outcome)) = in_flight.next() => {
                    // Everything the finished future reported is already queued
                    while let Ok(event) = events_rx.try_recv() {
                        ledger.apply(event);
                    }
                    registry.remove(&index);
                    ledger.settle(index, outcome);
                }
                _ = ticker.tick() => ledger.sample(),
                Some(ControlMessage::Cancel) = control.recv() => {
                    ledger.cancel(&registry, &mut pending);
                }
            }
        }

        ledger.finish();
    }
}

impl std::fmt::Debug for TransferOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferOrchestrator")
            .field("strategy", &self.strategy)
            .field("sample_interval", &self.sample_interval)
            .finish_non_exhaustive()
    }
}

fn file_destination(state: &InstallerState, index: usize, file: &RemoteFileDescriptor) -> PathBuf {
    state
        .files
        .get(index)
        .map(|status| status.local.clone())
        .unwrap_or_else(|| file.local_path(&state.directory))
}

/// Run one transfer until it completes, fails, or `token` is cancelled.
///
/// Cancellation drops the in-progress copy, which closes the remote stream
/// and the local sink without waiting for pending writes.
async fn transfer_file<'a>(
    index: usize,
    file: &'a RemoteFileDescriptor,
    local: PathBuf,
    storage: &'a dyn RemoteStorage,
    writer: &'a dyn FileWriter,
    events: mpsc::UnboundedSender<TransferEvent>,
    token: CancellationToken,
) -> (usize, TransferResult<()>) {
    let outcome = tokio::select! {
        biased;
        _ = token.cancelled() => Err(TransferError::Cancelled),
        result = copy_to_local(index, file, &local, storage, writer, &events) => result,
    };
    (index, outcome)
}

async fn copy_to_local(
    index: usize,
    file: &RemoteFileDescriptor,
    local: &Path,
    storage: &dyn RemoteStorage,
    writer: &dyn FileWriter,
    events: &mpsc::UnboundedSender<TransferEvent>,
) -> TransferResult<()> {
    let mut sink = writer
        .create_sink(local)
        .await
        .map_err(|e| TransferError::sink(local, e))?;
    let mut stream = storage.open_stream(file).await?;

    // The loop outlives every transfer future, so sends cannot fail.
    let _ = events.send(TransferEvent::Started { index });

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        sink.write_all(&chunk)
            .await
            .map_err(|e| TransferError::sink(local, e))?;
        let _ = events.send(TransferEvent::Chunk {
            index,
            bytes: chunk.len() as u64,
        });
    }

    sink.flush()
        .await
        .map_err(|e| TransferError::sink(local, e))?;
    Ok(())
}

/// Applies transfer events to the state on behalf of the event loop.
struct TransferLedger<'a> {
    broadcaster: &'a mut Broadcaster,
    callbacks: &'a mut InstallCallbacks,
    /// Files whose accounting froze when cancellation was requested.
    cancelled: HashSet<usize>,
}

impl<'a> TransferLedger<'a> {
    fn new(broadcaster: &'a mut Broadcaster, callbacks: &'a mut InstallCallbacks) -> Self {
        Self {
            broadcaster,
            callbacks,
            cancelled: HashSet::new(),
        }
    }

    fn state(&self) -> &InstallerState {
        self.broadcaster.state()
    }

    fn apply(&mut self, event: TransferEvent) {
        match event {
            TransferEvent::Started { index } => self.started(index),
            TransferEvent::Chunk { index, bytes } => self.chunk(index, bytes),
        }
    }

    fn started(&mut self, index: usize) {
        if self.cancelled.contains(&index) {
            return;
        }
        let InstallerState { files, loaded, .. } = self.broadcaster.state_mut();
        let Some(file) = files.get_mut(index) else {
            return;
        };

        *loaded = loaded.saturating_sub(file.loaded);
        file.loaded = 0;
        file.error = false;
        file.transfer = Some(ActiveTransfer::default());
        file.recompute_progress();
        debug!(file = %file.name, size = file.size, "Transfer started");

        self.callbacks.file_progress(file);
        self.broadcaster.notify();
    }

    fn chunk(&mut self, index: usize, bytes: u64) {
        if self.cancelled.contains(&index) {
            return;
        }
        let state = self.broadcaster.state_mut();
        let Some(file) = state.files.get_mut(index) else {
            return;
        };

        // Never account more than the manifest size
        let accounted = bytes.min(file.size.saturating_sub(file.loaded));
        file.loaded += accounted;
        if let Some(transfer) = file.transfer.as_mut() {
            transfer.recorded += bytes;
        }
        file.recompute_progress();
        self.callbacks.file_progress(file);

        state.loaded += accounted;
        state.recompute_progress();
        self.broadcaster.notify();
    }

    fn settle(&mut self, index: usize, outcome: TransferResult<()>) {
        let state = self.broadcaster.state_mut();
        let Some(file) = state.files.get_mut(index) else {
            return;
        };
        file.transfer = None;

        match outcome {
            Ok(()) => {
                let remaining = file.size.saturating_sub(file.loaded);
                file.mark_ready();
                state.loaded += remaining;
                debug!(file = %file.name, bytes = file.size, "Transfer complete");
                self.callbacks.file_complete(file);
            }
            Err(err) if err.is_cancelled() => {
                debug!(file = %file.name, "Transfer cancelled");
            }
            Err(err) => {
                file.error = true;
                warn!(file = %file.name, error = %err, "Transfer failed");
                self.callbacks.file_error(file, &err);
            }
        }

        state.recompute_progress();
        self.broadcaster.notify();
    }

    fn sample(&mut self) {
        // Speed stays at zero once a cancellation has halted the install
        if !self.cancelled.is_empty() {
            return;
        }
        self.broadcaster.update(InstallerState::sample_throughput);
    }

    fn cancel(&mut self, registry: &HashMap<usize, CancellationToken>, pending: &mut VecDeque<usize>) {
        info!(
            active = registry.len(),
            skipped = pending.len(),
            "Cancelling install"
        );
        pending.clear();

        for (&index, token) in registry {
            token.cancel();
            self.cancelled.insert(index);
            self.broadcaster.update(InstallerState::halt);
        }
    }

    fn finish(self) {
        let state = self.broadcaster.state_mut();
        state.halt();
        info!(
            ready = state.ready,
            error = state.error,
            loaded = state.loaded,
            size = state.size,
            "Install finished"
        );
        self.callbacks.complete(state);
        self.broadcaster.notify();
    }
}
