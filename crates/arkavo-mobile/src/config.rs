use crate::verify::VerifyOptions;
use crate::{MobileError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_NAVIGATION_CACHE_DURATION: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(100);
pub const DEFAULT_STABILITY_MAX_WAIT: Duration = Duration::from_millis(2000);
pub const DEFAULT_STABILITY_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_SNAPSHOT_CACHE_TTL: Duration = Duration::from_millis(500);
pub const DEFAULT_VERIFY_RETRY_COUNT: u32 = 3;
pub const DEFAULT_VERIFY_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(1500);

/// Tunables for one engine instance.
///
/// Durations are (de)serialized as milliseconds so the same record can be filled from
/// environment variables or handed over by the dispatch layer as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Program used to reach the device. Resolved from `PATH` when not absolute.
    pub adb_path: PathBuf,
    #[serde(with = "millis")]
    pub navigation_cache_duration: Duration,
    #[serde(with = "millis")]
    pub idle_timeout: Duration,
    #[serde(with = "millis")]
    pub stability_max_wait: Duration,
    #[serde(with = "millis")]
    pub stability_poll_interval: Duration,
    #[serde(with = "millis")]
    pub snapshot_cache_ttl: Duration,
    pub verify_retry_count: u32,
    #[serde(with = "millis")]
    pub verify_attempt_timeout: Duration,
    /// Where `include_screenshot` observations are written.
    pub screenshot_dir: PathBuf,
    /// Use `input motionevent` for multi-point paths (Android 11+ builds of `input`).
    pub motion_events: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            adb_path: PathBuf::from("adb"),
            navigation_cache_duration: DEFAULT_NAVIGATION_CACHE_DURATION,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            stability_max_wait: DEFAULT_STABILITY_MAX_WAIT,
            stability_poll_interval: DEFAULT_STABILITY_POLL_INTERVAL,
            snapshot_cache_ttl: DEFAULT_SNAPSHOT_CACHE_TTL,
            verify_retry_count: DEFAULT_VERIFY_RETRY_COUNT,
            verify_attempt_timeout: DEFAULT_VERIFY_ATTEMPT_TIMEOUT,
            screenshot_dir: std::env::temp_dir().join("arkavo-mobile"),
            motion_events: false,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with any `ARKAVO_*` variables set in the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("ARKAVO_ADB_PATH") {
            config.adb_path = PathBuf::from(path);
        }
        if let Some(secs) = lookup("ARKAVO_NAV_CACHE_SECS") {
            config.navigation_cache_duration = Duration::from_secs(parse_number(
                "ARKAVO_NAV_CACHE_SECS",
                &secs,
            )?);
        }
        if let Some(ms) = lookup("ARKAVO_IDLE_TIMEOUT_MS") {
            config.idle_timeout = Duration::from_millis(parse_number("ARKAVO_IDLE_TIMEOUT_MS", &ms)?);
        }
        if let Some(ms) = lookup("ARKAVO_STABILITY_MAX_WAIT_MS") {
            config.stability_max_wait =
                Duration::from_millis(parse_number("ARKAVO_STABILITY_MAX_WAIT_MS", &ms)?);
        }
        if let Some(ms) = lookup("ARKAVO_SNAPSHOT_CACHE_MS") {
            config.snapshot_cache_ttl =
                Duration::from_millis(parse_number("ARKAVO_SNAPSHOT_CACHE_MS", &ms)?);
        }
        if let Some(dir) = lookup("ARKAVO_SCREENSHOT_DIR") {
            config.screenshot_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("ARKAVO_MOTION_EVENTS") {
            config.motion_events = flag == "1" || flag.eq_ignore_ascii_case("true");
        }

        Ok(config)
    }

    pub fn verify_options(&self) -> VerifyOptions {
        VerifyOptions::new(self.verify_retry_count, self.verify_attempt_timeout)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| MobileError::Config(format!("{} must be a whole number ({}): {}", key, value, e)))
}

pub(crate) mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
