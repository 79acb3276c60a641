//! Core types for Placenote

mod event;
mod notification;
mod outcome;
mod place;
mod reason;
mod region;

pub use event::{ActionType, EventKind, LogEvent};
pub use notification::{
    CounterSnapshot, NotificationAction, NotificationCategory, NotificationPayload, ResponseAction,
    SessionCounters, DEFAULT_TAP_ID,
};
pub use outcome::{ComposeOutcome, ResponseOutcome, UpdateOutcome, WorkingSetDiff};
pub use place::{Coordinate, Place, PlaceIdentity};
pub use reason::ReasonCode;
pub use region::{RegionEvent, RegionEventKind};
