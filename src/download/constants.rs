//! Constants for the download module (timeouts, stats tuning).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Maximum number of speed samples kept for the average (oldest evicted first).
pub const SPEED_SAMPLE_SIZE: usize = 20;

/// Outlier trimming kicks in once the window holds more than this many samples.
pub const SPEED_TRIM_THRESHOLD: usize = 7;

/// Minimum delay between average-speed and time-left recomputations.
pub const STATS_RECOMPUTE_INTERVAL: Duration = Duration::from_secs(1);

/// Sentinel reported when the remaining time cannot be estimated.
pub const UNKNOWN_TIME_LEFT: &str = "???";
