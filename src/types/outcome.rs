//! Outcome structures returned by the manager and the composer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CounterSnapshot, NotificationPayload, Place, ReasonCode};

/// Stop/start sets produced by the differ
#[derive(Debug, Clone, Default)]
pub struct WorkingSetDiff {
    pub to_stop: Vec<Place>,
    pub to_start: Vec<Place>,
}

impl WorkingSetDiff {
    pub fn is_empty(&self) -> bool {
        self.to_stop.is_empty() && self.to_start.is_empty()
    }
}

/// Result of one location update, reset or seed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub timestamp: DateTime<Utc>,
    pub reason: ReasonCode,
    /// Regions the gateway accepted to start
    pub started: Vec<String>,
    /// Regions the gateway accepted to stop
    pub stopped: Vec<String>,
    /// Regions whose start/stop the gateway refused
    pub failed: Vec<String>,
    /// Working-set size after the operation
    pub working_set_len: usize,
}

impl UpdateOutcome {
    pub fn new(reason: ReasonCode, working_set_len: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            reason,
            started: Vec::new(),
            stopped: Vec::new(),
            failed: Vec::new(),
            working_set_len,
        }
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = match self.reason {
            ReasonCode::G001_NO_CHANGE => "\x1b[90m",
            ReasonCode::G002_ORIGIN_UNAVAILABLE | ReasonCode::G003_GATEWAY_PARTIAL => "\x1b[31m",
            _ => "\x1b[32m",
        };

        format!(
            "{}+{} -{} !{} | regions={} | {}\x1b[0m",
            color,
            self.started.len(),
            self.stopped.len(),
            self.failed.len(),
            self.working_set_len,
            self.reason.code(),
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "started={} | stopped={} | failed={} | regions={} | reason={}",
            self.started.join(","),
            self.stopped.join(","),
            self.failed.join(","),
            self.working_set_len,
            self.reason.code()
        )
    }
}

/// Result of handling one region event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeOutcome {
    pub reason: ReasonCode,
    /// What was handed to delivery, if anything
    pub payload: Option<NotificationPayload>,
}

/// Result of handling one notification response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseOutcome {
    pub reason: ReasonCode,
    pub counters: CounterSnapshot,
}
