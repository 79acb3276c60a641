//! Append-only event logger
//!
//! Best effort: a failed write is traced and dropped, never returned.

use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::error::PlacenoteError;
use crate::types::{EventKind, LogEvent};

/// Sink for framed log events
pub trait EventLogger: Send + Sync {
    /// Record one event; must not fail
    fn append(&self, event: LogEvent);
}

/// Writes events to `log_<yyyy-MM-dd_HH:mm:ss>.txt`, one pretty-printed
/// JSON object per event followed by a `,` separator.
#[derive(Debug)]
pub struct FileEventLogger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileEventLogger {
    /// Logger for a file named after the current time, inside `dir`.
    /// Nothing touches the disk until the first append.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let name = format!("log_{}.txt", Utc::now().format("%Y-%m-%d_%H:%M:%S"));
        Self::with_path(dir.as_ref().join(name))
    }

    /// Logger for an explicit file path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_event(&self, event: &LogEvent) -> Result<(), PlacenoteError> {
        let mut framed = serde_json::to_string_pretty(event)
            .map_err(|e| PlacenoteError::Log(std::io::Error::other(e)))?;
        framed.push(',');

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(PlacenoteError::Log)?;
        }

        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(PlacenoteError::Log)?;
        file.write_all(framed.as_bytes()).map_err(PlacenoteError::Log)
    }
}

impl EventLogger for FileEventLogger {
    fn append(&self, event: LogEvent) {
        debug!(kind = %event.kind, place = ?event.place_id, "event");
        if let Err(e) = self.write_event(&event) {
            warn!(path = %self.path.display(), error = %e, "failed to append event");
        }
    }
}

/// Keeps events in memory
#[derive(Debug, Default)]
pub struct MemoryEventLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl MemoryEventLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything appended so far
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// Number of events of one kind
    pub fn count(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }
}

impl EventLogger for MemoryEventLogger {
    fn append(&self, event: LogEvent) {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActionType;

    #[test]
    fn test_file_logger_appends_framed_events() {
        let dir = tempfile::tempdir().unwrap();
        let logger = FileEventLogger::new(dir.path().join("logs"));

        logger.append(LogEvent::new(EventKind::AppStarted));
        logger.append(
            LogEvent::new(EventKind::ReceiveNotification)
                .with_action(ActionType::Useful)
                .with_place("Old Gate"),
        );

        let content = std::fs::read_to_string(logger.path()).unwrap();
        assert!(content.ends_with(','));

        // The separators make the file a JSON array body
        let array = format!("[{}]", content.trim_end_matches(','));
        let events: Vec<LogEvent> = serde_json::from_str(&array).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].action_type, Some(ActionType::Useful));
        assert_eq!(events[1].place_id.as_deref(), Some("Old Gate"));
    }

    #[test]
    fn test_file_name_carries_timestamp() {
        let logger = FileEventLogger::new("/tmp");
        let name = logger.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("log_"));
        assert!(name.ends_with(".txt"));
    }

    #[test]
    fn test_unwritable_path_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be
        let logger = FileEventLogger::with_path(dir.path());
        logger.append(LogEvent::new(EventKind::Reset));
    }

    #[test]
    fn test_memory_logger_counts() {
        let logger = MemoryEventLogger::new();
        logger.append(LogEvent::new(EventKind::Reset));
        logger.append(LogEvent::new(EventKind::Reset));
        logger.append(LogEvent::new(EventKind::AppStarted));

        assert_eq!(logger.count(EventKind::Reset), 2);
        assert_eq!(logger.events().len(), 3);
    }
}
