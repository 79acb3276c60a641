//! Log events handed to the event logger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Service started
    #[serde(rename = "Enter")]
    AppStarted,
    /// A notification was composed and handed to delivery
    SendNotification,
    /// The visitor answered (or tapped) a notification
    #[serde(rename = "receiveNotification")]
    ReceiveNotification,
    /// A region event named no catalog entry
    PlaceMismatch,
    /// The region gateway refused a start/stop
    GatewayFailure,
    /// Image fetch failed or timed out
    ImageUnavailable,
    /// A location update arrived without a usable position
    OriginUnavailable,
    /// All regions stopped on request
    Reset,
}

impl EventKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AppStarted => "Enter",
            Self::SendNotification => "SendNotification",
            Self::ReceiveNotification => "receiveNotification",
            Self::PlaceMismatch => "PlaceMismatch",
            Self::GatewayFailure => "GatewayFailure",
            Self::ImageUnavailable => "ImageUnavailable",
            Self::OriginUnavailable => "OriginUnavailable",
            Self::Reset => "Reset",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response classification attached to `receiveNotification` events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    Useful,
    Useless,
    #[serde(rename = "mistake")]
    Mistake,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Useful => "Useful",
            Self::Useless => "Useless",
            Self::Mistake => "mistake",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Useful" => Ok(Self::Useful),
            "Useless" => Ok(Self::Useless),
            "mistake" => Ok(Self::Mistake),
            other => Err(format!("unknown action type '{}'", other)),
        }
    }
}

/// Immutable record of a notable occurrence.
///
/// Serialized with the field names of the append-only log; absent
/// optional fields are written as empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(rename = "datetime")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "content")]
    pub kind: EventKind,
    #[serde(rename = "actionType", with = "empty_is_none")]
    pub action_type: Option<ActionType>,
    #[serde(rename = "placeId", with = "empty_is_none")]
    pub place_id: Option<String>,
    #[serde(with = "empty_is_none")]
    pub message: Option<String>,
}

impl LogEvent {
    /// New event stamped now
    pub fn new(kind: EventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            action_type: None,
            place_id: None,
            message: None,
        }
    }

    pub fn with_action(mut self, action: ActionType) -> Self {
        self.action_type = Some(action);
        self
    }

    pub fn with_place(mut self, place_id: impl Into<String>) -> Self {
        self.place_id = Some(place_id.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

mod empty_is_none {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(v) => v.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: Display,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_fields_serialize_empty() {
        let event = LogEvent::new(EventKind::AppStarted);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["content"], "Enter");
        assert_eq!(json["actionType"], "");
        assert_eq!(json["placeId"], "");
        assert_eq!(json["message"], "");
        assert!(json["datetime"].is_string());
    }

    #[test]
    fn test_response_event_reads_back() {
        let event = LogEvent::new(EventKind::ReceiveNotification)
            .with_action(ActionType::Mistake)
            .with_message("default tap");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"actionType\":\"mistake\""));

        let restored: LogEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, event);
        assert_eq!(restored.place_id, None);
    }
}
