//! Progress statistics for download sessions.
//!
//! This module owns the speed/ETA math: instantaneous speed sampling into a
//! bounded window, a trimmed-mean average that resists transient spikes and
//! stalls, and a human-readable time-remaining estimate. All timing state is
//! per-session, so independent sessions never share statistics.

use std::collections::VecDeque;
use std::time::Instant;

use serde::Serialize;

use super::constants::{
    SPEED_SAMPLE_SIZE, SPEED_TRIM_THRESHOLD, STATS_RECOMPUTE_INTERVAL, UNKNOWN_TIME_LEFT,
};

/// Caller-visible progress for one download session.
///
/// Recomputed by [`DownloadSession::poll`](super::DownloadSession::poll)
/// whenever new chunks were drained; read the fields only after a poll.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    /// Bytes written so far. Never decreases while the session is running.
    pub downloaded_bytes: u64,
    /// Total expected bytes, or 0 when the server did not report a size.
    pub total_bytes: u64,
    /// Progress in `[0, 1]`. Stays 0 while the total is unknown, until the
    /// completion heuristic forces it to 1.0.
    pub fraction: f64,
    /// `fraction * 100`.
    pub percentage: f64,
    /// Instantaneous speed in bytes/sec, from the most recent poll interval.
    pub speed: f64,
    /// Trimmed-mean average speed in bytes/sec.
    pub average_speed: f64,
    /// Estimated time remaining as `H:MM:SS`, or `"???"` when unknown.
    pub time_left: String,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            downloaded_bytes: 0,
            total_bytes: 0,
            fraction: 0.0,
            percentage: 0.0,
            speed: 0.0,
            average_speed: 0.0,
            time_left: UNKNOWN_TIME_LEFT.to_string(),
        }
    }
}

/// One recomputation result handed back to the session.
#[derive(Debug)]
pub(crate) struct SpeedReading {
    pub(crate) speed: f64,
    pub(crate) average: f64,
    pub(crate) time_left: String,
}

/// Per-session speed and ETA state.
///
/// `update` is called once per poll that drained new chunks, with the
/// cumulative counters from the last drained message. The average speed and
/// the time-left string are each recomputed at most once per second; faster
/// polls get the previously computed values back, which keeps the displayed
/// numbers stable under rapid polling.
#[derive(Debug)]
pub(crate) struct SpeedTracker {
    last_check: Instant,
    last_size: u64,
    samples: VecDeque<f64>,
    average: f64,
    average_checked_at: Option<Instant>,
    time_left: String,
    time_left_checked_at: Option<Instant>,
}

impl SpeedTracker {
    pub(crate) fn new() -> Self {
        Self {
            last_check: Instant::now(),
            last_size: 0,
            samples: VecDeque::with_capacity(SPEED_SAMPLE_SIZE),
            average: 0.0,
            average_checked_at: None,
            time_left: UNKNOWN_TIME_LEFT.to_string(),
            time_left_checked_at: None,
        }
    }

    /// Resets the elapsed-time baseline. Called when the transfer starts so
    /// the first sample is not measured from session construction time.
    pub(crate) fn mark_started(&mut self) {
        self.last_check = Instant::now();
    }

    /// Folds the latest cumulative counters into the sample window and
    /// returns the current readings.
    pub(crate) fn update(&mut self, downloaded: u64, total: u64) -> SpeedReading {
        let now = Instant::now();
        let speed = self.sample_speed(now, downloaded);
        let average = self.average_speed(now);
        let time_left = self.time_left(now, downloaded, total, average);
        self.last_check = now;
        self.last_size = downloaded;
        SpeedReading {
            speed,
            average,
            time_left,
        }
    }

    /// Computes the instantaneous speed since the previous update and appends
    /// it to the bounded sample window.
    fn sample_speed(&mut self, now: Instant, downloaded: u64) -> f64 {
        let mut elapsed = now.duration_since(self.last_check).as_secs_f64();
        if elapsed == 0.0 {
            // Guard against division by zero on back-to-back recomputes.
            elapsed = 1.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let speed = downloaded.saturating_sub(self.last_size) as f64 / elapsed;

        self.samples.push_back(speed);
        while self.samples.len() > SPEED_SAMPLE_SIZE {
            self.samples.pop_front();
        }
        speed
    }

    /// Returns the trimmed-mean average speed, recomputed at most once per
    /// second. Within the interval the previous average is returned unchanged.
    fn average_speed(&mut self, now: Instant) -> f64 {
        if let Some(checked_at) = self.average_checked_at
            && now.duration_since(checked_at) < STATS_RECOMPUTE_INTERVAL
        {
            return self.average;
        }

        self.average = trimmed_mean(&self.samples);
        self.average_checked_at = Some(now);
        self.average
    }

    /// Returns the time-left estimate, recomputed at most once per second.
    ///
    /// Unknown total size and a zero average speed both report the `"???"`
    /// sentinel; neither is an error.
    fn time_left(&mut self, now: Instant, downloaded: u64, total: u64, average: f64) -> String {
        if total == 0 {
            return UNKNOWN_TIME_LEFT.to_string();
        }

        if let Some(checked_at) = self.time_left_checked_at
            && now.duration_since(checked_at) < STATS_RECOMPUTE_INTERVAL
        {
            return self.time_left.clone();
        }

        self.time_left = if average > 0.0 {
            #[allow(clippy::cast_precision_loss)]
            let remaining = total.saturating_sub(downloaded) as f64 / average;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            format_time_left(remaining as u64)
        } else {
            UNKNOWN_TIME_LEFT.to_string()
        };
        self.time_left_checked_at = Some(now);
        self.time_left.clone()
    }
}

/// Arithmetic mean of the sample window, discarding the two highest and two
/// lowest samples once the window holds more than seven.
fn trimmed_mean(samples: &VecDeque<f64>) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let mut sample: Vec<f64> = samples.iter().copied().collect();
    if sample.len() > SPEED_TRIM_THRESHOLD {
        sample.sort_by(f64::total_cmp);
        sample.drain(..2);
        sample.truncate(sample.len() - 2);
    }

    #[allow(clippy::cast_precision_loss)]
    let mean = sample.iter().sum::<f64>() / sample.len() as f64;
    mean
}

/// Formats whole seconds as `H:MM:SS` (hours unbounded, minutes and seconds
/// zero-padded to two digits).
fn format_time_left(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}
