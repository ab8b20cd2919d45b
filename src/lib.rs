//! Hauler Core Library
//!
//! This library provides the core functionality for the hauler tool: a
//! non-blocking file downloader used to fetch large remote artifacts
//! (installers, runtime packages) without freezing the calling application.
//!
//! # Architecture
//!
//! The network transfer runs on a background task which feeds a chunk
//! channel; the caller polls a [`DownloadSession`] at a bounded interval to
//! drain chunks to disk and read progress statistics (instantaneous speed,
//! trimmed-mean average speed, time remaining). Cancellation is cooperative
//! and always removes the partial destination file.
//!
//! The library is organized into the following modules:
//! - [`download`] - download sessions, transfer worker, progress statistics

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;

// Re-export commonly used types
pub use download::{
    DownloadError, DownloadSession, DownloadState, HttpClient, ProgressSnapshot, UNKNOWN_TIME_LEFT,
};
