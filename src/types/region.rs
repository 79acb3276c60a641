//! Region trigger kinds and events

use serde::{Deserialize, Serialize};

/// What made the composer fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionEventKind {
    /// Visitor entered a monitored region
    Enter,
    /// Visitor left a monitored region
    Exit,
    /// Periodic timer feed, independent of position
    Timer,
}

impl RegionEventKind {
    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            RegionEventKind::Enter => "\x1b[32m", // Green
            RegionEventKind::Exit => "\x1b[33m",  // Yellow
            RegionEventKind::Timer => "\x1b[36m", // Cyan
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    /// Get emoji for kind
    pub fn emoji(&self) -> &'static str {
        match self {
            RegionEventKind::Enter => "📍",
            RegionEventKind::Exit => "👣",
            RegionEventKind::Timer => "⏰",
        }
    }
}

impl std::fmt::Display for RegionEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RegionEventKind::Enter => "ENTER",
            RegionEventKind::Exit => "EXIT",
            RegionEventKind::Timer => "TIMER",
        };
        write!(f, "{}", name)
    }
}

/// A raw signal for one region, as delivered by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionEvent {
    pub kind: RegionEventKind,
    /// Region identifier (= place name)
    pub name: String,
}

impl RegionEvent {
    pub fn new(kind: RegionEventKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}
