//! Runtime configuration
//!
//! Defaults, then `PLACENOTE_*` environment variables. The binary layers
//! its CLI flags on top.

use std::path::PathBuf;
use std::time::Duration;

use crate::IMAGE_FETCH_TIMEOUT_MS;

/// Runtime configuration for a Placenote service
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON catalog of places
    pub catalog_path: PathBuf,
    /// Directory receiving the append-only event log
    pub log_dir: PathBuf,
    /// Directory holding downloaded exhibit images
    pub cache_dir: PathBuf,
    /// Upper bound on waiting for an image before sending without it
    pub image_timeout: Duration,
    /// Interval of the timer feed; `None` disables it
    pub timer_interval: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("outputList.json"),
            log_dir: PathBuf::from("./logs"),
            cache_dir: PathBuf::from("./image_cache"),
            image_timeout: Duration::from_millis(IMAGE_FETCH_TIMEOUT_MS),
            timer_interval: None,
        }
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("PLACENOTE_CATALOG") {
            config.catalog_path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("PLACENOTE_LOG_DIR") {
            config.log_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("PLACENOTE_CACHE_DIR") {
            config.cache_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("PLACENOTE_IMAGE_TIMEOUT_MS") {
            if let Ok(ms) = val.parse() {
                config.image_timeout = Duration::from_millis(ms);
            }
        }
        if let Ok(val) = std::env::var("PLACENOTE_TIMER_SECS") {
            config.timer_interval = parse_timer_secs(&val);
        }

        config
    }
}

/// `0` or garbage disables the timer feed
fn parse_timer_secs(val: &str) -> Option<Duration> {
    match val.trim().parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
    }
}
