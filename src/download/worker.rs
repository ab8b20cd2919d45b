//! Transfer worker: the streaming fetch feeding a session's chunk channel.
//!
//! The worker runs on its own Tokio task and never touches the filesystem;
//! it only posts chunks plus cumulative byte counters onto the channel. The
//! session side owns the destination file and drains the channel on poll.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use reqwest::Client;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::error::DownloadError;

/// Unit passed from the transfer worker to the session.
///
/// Ordering is FIFO; the channel never reorders or drops messages.
#[derive(Debug)]
pub(crate) struct ChunkMessage {
    /// Raw chunk payload, appended to the destination file in arrival order.
    pub(crate) payload: Vec<u8>,
    /// Cumulative bytes received up to and including this chunk.
    pub(crate) received_bytes: u64,
    /// Total expected bytes from Content-Length, or 0 when unknown.
    pub(crate) total_bytes: u64,
}

/// Streams one URL, posting each received chunk onto `chunks`.
///
/// The cancellation flag is checked between chunk reads, never during one,
/// so at most one chunk's worth of extra work happens after a cancel
/// request. Cancellation is not an error: the worker returns `Ok` and the
/// session is responsible for cleanup.
pub(crate) async fn fetch_stream(
    client: Client,
    url: String,
    chunks: UnboundedSender<ChunkMessage>,
    cancel: Arc<AtomicBool>,
) -> Result<(), DownloadError> {
    debug!(url = %url, "starting transfer");

    let response = client.get(&url).send().await.map_err(|e| {
        if e.is_timeout() {
            DownloadError::timeout(&url)
        } else {
            DownloadError::network(&url, e)
        }
    })?;

    if !response.status().is_success() {
        return Err(DownloadError::http_status(&url, response.status().as_u16()));
    }

    let total_bytes = response.content_length().unwrap_or(0);
    let mut received_bytes: u64 = 0;
    let mut stream = response.bytes_stream();

    loop {
        if cancel.load(Ordering::SeqCst) {
            debug!(url = %url, received_bytes, "transfer cancelled");
            return Ok(());
        }

        let Some(chunk_result) = stream.next().await else {
            break;
        };
        let chunk = chunk_result.map_err(|e| DownloadError::network(&url, e))?;
        received_bytes += chunk.len() as u64;

        let message = ChunkMessage {
            payload: chunk.to_vec(),
            received_bytes,
            total_bytes,
        };
        if chunks.send(message).is_err() {
            // Receiver dropped: the session is gone, nothing left to notify.
            debug!(url = %url, "chunk receiver dropped, stopping transfer");
            return Ok(());
        }
    }

    debug!(url = %url, received_bytes, total_bytes, "transfer finished");
    Ok(())
}
