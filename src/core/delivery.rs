//! Notification delivery collaborators

use colored::Colorize;
use std::sync::Mutex;

use crate::types::NotificationPayload;

/// Hands a composed notification to whatever displays it.
/// Fire-and-forget: failures are not reported back.
pub trait NotificationDelivery: Send + Sync {
    fn deliver(&self, payload: NotificationPayload);
}

/// Prints notifications to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalDelivery {
    pub json: bool,
    pub no_color: bool,
}

impl TerminalDelivery {
    pub fn new(json: bool, no_color: bool) -> Self {
        Self { json, no_color }
    }

    fn render(&self, payload: &NotificationPayload) -> String {
        let actions: Vec<&str> = payload.category.actions.iter().map(|a| a.title.as_str()).collect();
        let image = payload
            .image_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());

        if self.no_color {
            format!(
                "[{}] {}\n  {}\n  {}\n  image={} | actions={}",
                payload.trigger,
                payload.title,
                payload.subtitle,
                payload.body.replace('\n', "\n  "),
                image,
                actions.join(" / ")
            )
        } else {
            format!(
                "{}{} {}{}\n  {}\n  {}\n  {}",
                payload.trigger.color_code(),
                payload.trigger.emoji(),
                payload.title.bold(),
                crate::types::RegionEventKind::color_reset(),
                payload.subtitle.italic(),
                payload.body.replace('\n', "\n  "),
                format!("image={} | actions={}", image, actions.join(" / ")).dimmed()
            )
        }
    }
}

impl NotificationDelivery for TerminalDelivery {
    fn deliver(&self, payload: NotificationPayload) {
        if self.json {
            match serde_json::to_string(&payload) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::warn!(error = %e, "notification not serializable"),
            }
        } else {
            println!("{}", self.render(&payload));
        }
    }
}

/// Keeps delivered notifications in memory
#[derive(Debug, Default)]
pub struct MemoryDelivery {
    delivered: Mutex<Vec<NotificationPayload>>,
}

impl MemoryDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything delivered so far
    pub fn delivered(&self) -> Vec<NotificationPayload> {
        self.delivered.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

impl NotificationDelivery for MemoryDelivery {
    fn deliver(&self, payload: NotificationPayload) {
        self.delivered.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(payload);
    }
}
