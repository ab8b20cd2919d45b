//! Download session: the caller-facing controller state machine.
//!
//! A [`DownloadSession`] owns the destination file, launches the transfer
//! worker, and exposes a non-blocking [`poll`](DownloadSession::poll) that
//! drains received chunks, appends them to disk, and recomputes progress
//! statistics. Call `start()`, then poll at a bounded interval (100-500 ms
//! works well) until the state turns terminal; stop with `cancel()`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use super::client::HttpClient;
use super::error::DownloadError;
use super::stats::{ProgressSnapshot, SpeedTracker};
use super::worker::{self, ChunkMessage};

/// Lifecycle state of a [`DownloadSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    /// Constructed, not yet started.
    Idle,
    /// Worker launched, destination file open.
    Running,
    /// Cancelled by the caller; destination file removed.
    Cancelled,
    /// Transfer finished and all chunks were written.
    Completed,
    /// Worker reported an error; partial file left on disk.
    Failed,
}

impl DownloadState {
    /// Whether the session has reached a terminal state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed | Self::Failed)
    }
}

/// Non-blocking downloader for one URL to one destination path.
///
/// The network transfer runs on a background Tokio task; the session's
/// methods never await the network. The chunk channel is the only state
/// shared with the worker, and the destination file handle is exclusively
/// owned by the session. Sessions are independent: running several
/// concurrently shares nothing but the filesystem.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use std::time::Duration;
/// use hauler::download::{DownloadSession, HttpClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let mut session = DownloadSession::new(
///     "https://example.com/runtime.tar.xz",
///     Path::new("./runtime.tar.xz"),
///     true,
/// );
/// session.start(&client).await?;
/// while !session.state().is_terminal() {
///     let progress = session.poll().await?;
///     println!("{:.1}% ({})", progress.percentage, progress.time_left);
///     tokio::time::sleep(Duration::from_millis(150)).await;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DownloadSession {
    url: String,
    dest: PathBuf,
    overwrite: bool,
    state: DownloadState,
    file: Option<BufWriter<File>>,
    cancel: Arc<AtomicBool>,
    chunks: Option<UnboundedReceiver<ChunkMessage>>,
    worker: Option<JoinHandle<Result<(), DownloadError>>>,
    tracker: SpeedTracker,
    snapshot: ProgressSnapshot,
}

impl DownloadSession {
    /// Creates a session in the `Idle` state. Nothing happens until
    /// [`start`](Self::start).
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            url: url.into(),
            dest: dest.into(),
            overwrite,
            state: DownloadState::Idle,
            file: None,
            cancel: Arc::new(AtomicBool::new(false)),
            chunks: None,
            worker: None,
            tracker: SpeedTracker::new(),
            snapshot: ProgressSnapshot::default(),
        }
    }

    /// The source URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The destination path.
    #[must_use]
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DownloadState {
        self.state
    }

    /// The last computed snapshot, without recomputation.
    #[must_use]
    pub fn progress(&self) -> &ProgressSnapshot {
        &self.snapshot
    }

    /// Opens the destination file and launches the transfer worker.
    ///
    /// With `overwrite` set, an existing destination file is removed first;
    /// either way the file is created/truncated for exclusive writing.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::AlreadyStarted`] if the session is not `Idle`.
    /// - [`DownloadError::InvalidUrl`] if the URL does not parse.
    /// - [`DownloadError::Io`] if the destination cannot be prepared; this
    ///   fails synchronously, before any worker is launched.
    pub async fn start(&mut self, client: &HttpClient) -> Result<(), DownloadError> {
        if self.state != DownloadState::Idle {
            return Err(DownloadError::AlreadyStarted);
        }

        Url::parse(&self.url).map_err(|_| DownloadError::invalid_url(self.url.clone()))?;

        debug!(url = %self.url, dest = %self.dest.display(), "starting download");

        if self.overwrite {
            match tokio::fs::remove_file(&self.dest).await {
                Ok(()) => debug!(dest = %self.dest.display(), "removed existing destination"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(DownloadError::io(self.dest.clone(), e)),
            }
        }

        let file = File::create(&self.dest)
            .await
            .map_err(|e| DownloadError::io(self.dest.clone(), e))?;
        self.file = Some(BufWriter::new(file));

        let (tx, rx) = mpsc::unbounded_channel();
        self.chunks = Some(rx);
        self.cancel = Arc::new(AtomicBool::new(false));
        self.tracker.mark_started();
        self.worker = Some(tokio::spawn(worker::fetch_stream(
            client.inner().clone(),
            self.url.clone(),
            tx,
            Arc::clone(&self.cancel),
        )));
        self.state = DownloadState::Running;
        info!(url = %self.url, "download started");
        Ok(())
    }

    /// Drains pending chunks, appends them to the destination file, and
    /// returns the refreshed progress snapshot.
    ///
    /// Non-blocking with respect to the network. When no chunks are pending
    /// the previous snapshot is returned without stats recomputation, which
    /// keeps near-zero elapsed intervals out of the speed math. Once the
    /// worker has terminated, the terminal poll flushes remaining chunks,
    /// closes the file, and transitions to `Completed` — or returns the
    /// worker's error and transitions to `Failed` (partial file left on
    /// disk for the caller to deal with).
    ///
    /// When the transfer ends without the server ever reporting a total
    /// size, progress is forced to 100% as long as some bytes arrived. A
    /// clean end of stream is the only completion signal available in that
    /// degraded mode; this is a heuristic, not a correctness guarantee.
    ///
    /// After `cancel()` the snapshot is frozen: late chunks are discarded,
    /// never written.
    ///
    /// # Errors
    ///
    /// Returns the worker's [`DownloadError`] on the poll that observes the
    /// failed transfer, or [`DownloadError::Io`] if appending to the
    /// destination fails.
    pub async fn poll(&mut self) -> Result<ProgressSnapshot, DownloadError> {
        if self.state != DownloadState::Running {
            return Ok(self.snapshot.clone());
        }

        let drained = match self.drain_chunks().await {
            Ok(drained) => drained,
            Err(error) => {
                // Local write failure: stop the worker, keep the partial file.
                warn!(url = %self.url, error = %error, "failed writing drained chunks");
                self.cancel.store(true, Ordering::SeqCst);
                self.chunks = None;
                self.worker = None;
                self.file = None;
                self.state = DownloadState::Failed;
                return Err(error);
            }
        };
        if let Some((received, total)) = drained {
            self.recompute(received, total);
        }

        if self.worker.as_ref().is_some_and(JoinHandle::is_finished) {
            return self.finish().await;
        }

        Ok(self.snapshot.clone())
    }

    /// Requests a cooperative stop and removes the destination file.
    ///
    /// No-op unless the session is `Running`. The worker observes the
    /// cancellation flag at its next read boundary; any chunk already in
    /// flight is discarded rather than written. After this returns, the
    /// destination path does not exist and the snapshot no longer updates.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] if removing the destination fails for
    /// a reason other than it already being absent.
    pub async fn cancel(&mut self) -> Result<(), DownloadError> {
        if self.state != DownloadState::Running {
            return Ok(());
        }

        debug!(url = %self.url, "download cancelled");
        self.cancel.store(true, Ordering::SeqCst);
        self.state = DownloadState::Cancelled;
        // Dropping the receiver makes any in-flight delivery fail, which
        // stops the worker even before it reaches the flag check.
        self.chunks = None;
        self.worker = None;
        // Close without flushing; the content is being removed anyway.
        self.file = None;

        match tokio::fs::remove_file(&self.dest).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(DownloadError::io(self.dest.clone(), e)),
        }
        Ok(())
    }

    /// Drains all currently queued messages, writing payloads in arrival
    /// order. Returns the cumulative counters from the newest message, or
    /// `None` when the channel had nothing pending.
    async fn drain_chunks(&mut self) -> Result<Option<(u64, u64)>, DownloadError> {
        let Some(chunks) = self.chunks.as_mut() else {
            return Ok(None);
        };

        let mut buffered: Vec<u8> = Vec::new();
        let mut newest = None;
        loop {
            match chunks.try_recv() {
                Ok(message) => {
                    buffered.extend_from_slice(&message.payload);
                    newest = Some((message.received_bytes, message.total_bytes));
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }

        if !buffered.is_empty()
            && let Some(writer) = self.file.as_mut()
        {
            writer
                .write_all(&buffered)
                .await
                .map_err(|e| DownloadError::io(self.dest.clone(), e))?;
            writer
                .flush()
                .await
                .map_err(|e| DownloadError::io(self.dest.clone(), e))?;
        }

        Ok(newest)
    }

    /// Updates the snapshot from the newest cumulative counters. Stats
    /// reflect only the last message of a drained batch; earlier payloads
    /// are already on disk.
    fn recompute(&mut self, received: u64, total: u64) {
        let reading = self.tracker.update(received, total);
        self.snapshot.downloaded_bytes = received;
        self.snapshot.total_bytes = total;
        self.snapshot.speed = reading.speed;
        self.snapshot.average_speed = reading.average;
        self.snapshot.time_left = reading.time_left;
        if total > 0 {
            #[allow(clippy::cast_precision_loss)]
            let fraction = (received as f64 / total as f64).clamp(0.0, 1.0);
            self.snapshot.fraction = fraction;
            self.snapshot.percentage = fraction * 100.0;
        }
    }

    /// Runs the completion path exactly once after the worker terminates.
    async fn finish(&mut self) -> Result<ProgressSnapshot, DownloadError> {
        let Some(handle) = self.worker.take() else {
            return Ok(self.snapshot.clone());
        };

        let outcome = match handle.await {
            Ok(result) => result,
            Err(join_error) => {
                warn!(url = %self.url, error = %join_error, "transfer worker panicked");
                Err(DownloadError::WorkerPanicked)
            }
        };

        // Final flush: the worker may have posted chunks after the last drain.
        let drained = match self.drain_chunks().await {
            Ok(drained) => drained,
            Err(error) => {
                self.chunks = None;
                self.file = None;
                self.state = DownloadState::Failed;
                return Err(error);
            }
        };
        if let Some((received, total)) = drained {
            self.recompute(received, total);
        }
        self.chunks = None;

        match outcome {
            Ok(()) => {
                if self.snapshot.total_bytes == 0 && self.snapshot.downloaded_bytes > 0 {
                    // Size-unknown heuristic: the server never reported a
                    // total, so a clean end of stream is the completion
                    // signal. Conflates "succeeded" with "size unknown".
                    self.snapshot.fraction = 1.0;
                    self.snapshot.percentage = 100.0;
                }
                self.close_file().await?;
                self.state = DownloadState::Completed;
                info!(
                    url = %self.url,
                    bytes = self.snapshot.downloaded_bytes,
                    "download finished"
                );
                Ok(self.snapshot.clone())
            }
            Err(error) => {
                // Close but leave the partial file on disk; unlike
                // cancellation, cleanup after a failure is the caller's call.
                if let Err(close_error) = self.close_file().await {
                    warn!(
                        dest = %self.dest.display(),
                        error = %close_error,
                        "failed closing destination after transfer error"
                    );
                }
                self.state = DownloadState::Failed;
                warn!(url = %self.url, error = %error, "download failed");
                Err(error)
            }
        }
    }

    /// Flushes and closes the destination file, exactly once.
    async fn close_file(&mut self) -> Result<(), DownloadError> {
        if let Some(mut writer) = self.file.take() {
            writer
                .flush()
                .await
                .map_err(|e| DownloadError::io(self.dest.clone(), e))?;
        }
        Ok(())
    }

    /// Test-only entry: puts the session into `Running` with a scripted
    /// worker future instead of a network fetch, returning the sender half
    /// of the chunk channel so tests can deliver chunks by hand.
    #[cfg(test)]
    #[allow(clippy::expect_used)]
    async fn start_scripted<F>(&mut self, scripted_worker: F) -> mpsc::UnboundedSender<ChunkMessage>
    where
        F: Future<Output = Result<(), DownloadError>> + Send + 'static,
    {
        assert_eq!(self.state, DownloadState::Idle, "scripted start needs Idle");
        let file = File::create(&self.dest)
            .await
            .expect("create scripted destination");
        self.file = Some(BufWriter::new(file));
        let (tx, rx) = mpsc::unbounded_channel();
        self.chunks = Some(rx);
        self.cancel = Arc::new(AtomicBool::new(false));
        self.tracker.mark_started();
        self.worker = Some(tokio::spawn(scripted_worker));
        self.state = DownloadState::Running;
        tx
    }
}
