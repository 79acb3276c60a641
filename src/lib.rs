//! Placenote: proximity-ranked geofence working set for exhibition visitors
//!
//! Location update → ranker → differ → region gateway (start/stop)
//! Region enter/exit → notification composer → delivery + event log

pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::PlacenoteError;

// =============================================================================
// WORKING SET [C]
// =============================================================================

/// Maximum number of regions monitored at once (top-K by proximity)
pub const REGION_CAPACITY: usize = 20;

/// Radius of every monitored region, in meters
pub const REGION_RADIUS_METERS: f64 = 100.0;

// =============================================================================
// NOTIFICATION [C]
// =============================================================================

/// Marker placed before a highlighted keyword
pub const HIGHLIGHT_OPEN: &str = "\"";

/// Marker placed after a highlighted keyword
pub const HIGHLIGHT_CLOSE: &str = "\"";

/// Category carrying the two response actions
pub const NOTIFICATION_CATEGORY_ID: &str = "category_select";

/// Response action: the visitor found the notification useful
pub const ACTION_USEFUL_ID: &str = "actionUseful";

/// Response action: the visitor found the notification not useful
pub const ACTION_USELESS_ID: &str = "actionUseless";

/// How long the composer waits for an image before sending without one
pub const IMAGE_FETCH_TIMEOUT_MS: u64 = 5000;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
