//! Reason codes for working-set and notification decisions

use serde::{Deserialize, Serialize};

/// Reason codes attached to every outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // G001-G005: Working set
    // =========================================================================
    /// Diff applied, at least one region started or stopped
    G001_DIFF_APPLIED,
    /// Top-K unchanged, nothing to do
    G001_NO_CHANGE,
    /// Update refused, no usable position
    G002_ORIGIN_UNAVAILABLE,
    /// Some start/stop requests failed; retried next update
    G003_GATEWAY_PARTIAL,
    /// Every region stopped
    G004_RESET,
    /// Initial regions admitted in catalog order
    G005_SEEDED,

    // =========================================================================
    // N001-N005: Notifications
    // =========================================================================
    /// Notification composed and handed to delivery
    N001_NOTIFICATION_SENT,
    /// Region identifier matched no catalog entry
    N002_PLACE_MISMATCH,
    /// Notification sent, image could not be resolved
    N003_SENT_WITHOUT_IMAGE,
    /// Useful / not-useful response counted
    N004_RESPONSE_RECORDED,
    /// Default tap or unknown response identifier
    N005_RESPONSE_MISTAKE,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::G001_DIFF_APPLIED => "G001_DIFF_APPLIED",
            Self::G001_NO_CHANGE => "G001_NO_CHANGE",
            Self::G002_ORIGIN_UNAVAILABLE => "G002_ORIGIN_UNAVAILABLE",
            Self::G003_GATEWAY_PARTIAL => "G003_GATEWAY_PARTIAL",
            Self::G004_RESET => "G004_RESET",
            Self::G005_SEEDED => "G005_SEEDED",
            Self::N001_NOTIFICATION_SENT => "N001_NOTIFICATION_SENT",
            Self::N002_PLACE_MISMATCH => "N002_PLACE_MISMATCH",
            Self::N003_SENT_WITHOUT_IMAGE => "N003_SENT_WITHOUT_IMAGE",
            Self::N004_RESPONSE_RECORDED => "N004_RESPONSE_RECORDED",
            Self::N005_RESPONSE_MISTAKE => "N005_RESPONSE_MISTAKE",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::G001_DIFF_APPLIED => "Working set updated",
            Self::G001_NO_CHANGE => "Working set unchanged",
            Self::G002_ORIGIN_UNAVAILABLE => "No usable position",
            Self::G003_GATEWAY_PARTIAL => "Gateway refused some regions",
            Self::G004_RESET => "All regions stopped",
            Self::G005_SEEDED => "Initial regions admitted",
            Self::N001_NOTIFICATION_SENT => "Notification sent",
            Self::N002_PLACE_MISMATCH => "No catalog entry for region",
            Self::N003_SENT_WITHOUT_IMAGE => "Notification sent without image",
            Self::N004_RESPONSE_RECORDED => "Response counted",
            Self::N005_RESPONSE_MISTAKE => "Response not counted",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
