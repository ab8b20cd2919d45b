//! Non-blocking HTTP download sessions with pollable progress.
//!
//! This module provides the download core: a background transfer worker
//! streams one URL, a [`DownloadSession`] drains received chunks on each
//! poll, appends them to the destination file, and derives throughput and
//! time-remaining estimates from arrival timing.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large files)
//! - Non-blocking polling: the caller never waits on the network
//! - Cooperative cancellation with guaranteed destination cleanup
//! - Trimmed-mean speed averaging, stable under bursts and stalls
//! - Configurable timeouts (30s connect, 5min read by default)
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use hauler::download::{DownloadSession, HttpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let mut session = DownloadSession::new(
//!     "https://example.com/runtime.tar.xz",
//!     Path::new("./runtime.tar.xz"),
//!     true,
//! );
//! session.start(&client).await?;
//! while !session.state().is_terminal() {
//!     let progress = session.poll().await?;
//!     println!("{:.1}%", progress.percentage);
//!     tokio::time::sleep(Duration::from_millis(150)).await;
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod filename;
mod session;
mod stats;
mod worker;

pub use client::HttpClient;
pub use constants::UNKNOWN_TIME_LEFT;
pub use error::DownloadError;
pub use filename::fallback_filename_from_url;
pub use session::{DownloadSession, DownloadState};
pub use stats::ProgressSnapshot;

// Note: no module-local Result alias on purpose.
// Use `Result<T, DownloadError>` explicitly in function signatures.
