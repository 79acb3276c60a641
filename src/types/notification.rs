//! Notification payloads, response actions and session tallies

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::RegionEventKind;
use crate::{ACTION_USEFUL_ID, ACTION_USELESS_ID, NOTIFICATION_CATEGORY_ID};

/// Identifier reported when the visitor taps the notification body itself
pub const DEFAULT_TAP_ID: &str = "default";

/// A response button offered with a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub id: String,
    pub title: String,
}

/// Category tag carrying the response buttons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationCategory {
    pub id: String,
    pub actions: Vec<NotificationAction>,
}

impl NotificationCategory {
    /// The "useful / not useful" category attached to every notification
    pub fn select() -> Self {
        Self {
            id: NOTIFICATION_CATEGORY_ID.to_string(),
            actions: vec![
                NotificationAction {
                    id: ACTION_USEFUL_ID.to_string(),
                    title: "Interesting".to_string(),
                },
                NotificationAction {
                    id: ACTION_USELESS_ID.to_string(),
                    title: "Not relevant".to_string(),
                },
            ],
        }
    }
}

/// A composed notification, ready for delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Region identifier the notification is about
    pub place_id: String,
    pub trigger: RegionEventKind,
    pub title: String,
    pub subtitle: String,
    pub body: String,
    /// Local copy of the exhibit image, when one could be resolved
    pub image_path: Option<PathBuf>,
    pub category: NotificationCategory,
    /// Play the default sound
    pub sound: bool,
}

/// A parsed response identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseAction {
    Useful,
    Useless,
    /// Body tapped instead of a button
    DefaultTap,
    /// Anything else
    Unrecognized(String),
}

impl ResponseAction {
    /// Classify a raw action identifier
    pub fn parse(action_id: &str) -> Self {
        match action_id {
            ACTION_USEFUL_ID => Self::Useful,
            ACTION_USELESS_ID => Self::Useless,
            "" | DEFAULT_TAP_ID => Self::DefaultTap,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

/// Useful / not-useful tallies for the process lifetime.
///
/// Response callbacks may overlap, so both counters are atomic.
#[derive(Debug, Default)]
pub struct SessionCounters {
    useful: AtomicU64,
    useless: AtomicU64,
}

/// Point-in-time copy of the counters, for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub useful: u64,
    pub useless: u64,
}

impl SessionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_useful(&self) -> u64 {
        self.useful.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn record_useless(&self) -> u64 {
        self.useless.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            useful: self.useful.load(Ordering::SeqCst),
            useless: self.useless.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_ids() {
        assert_eq!(ResponseAction::parse("actionUseful"), ResponseAction::Useful);
        assert_eq!(ResponseAction::parse("actionUseless"), ResponseAction::Useless);
        assert_eq!(ResponseAction::parse("default"), ResponseAction::DefaultTap);
        assert_eq!(ResponseAction::parse(""), ResponseAction::DefaultTap);
        assert_eq!(
            ResponseAction::parse("actionMaybe"),
            ResponseAction::Unrecognized("actionMaybe".to_string())
        );
    }

    #[test]
    fn test_counters_are_independent() {
        let counters = SessionCounters::new();
        counters.record_useful();
        counters.record_useful();
        counters.record_useless();

        assert_eq!(counters.snapshot(), CounterSnapshot { useful: 2, useless: 1 });
    }

    #[test]
    fn test_select_category_has_both_actions() {
        let category = NotificationCategory::select();
        let ids: Vec<&str> = category.actions.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec![ACTION_USEFUL_ID, ACTION_USELESS_ID]);
    }
}
