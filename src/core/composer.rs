//! Notification composer: region signal → message, image, delivery, log
//!
//! Reads the catalog and bumps the session counters. Never touches the
//! working set, so it can run on any task.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::core::catalog::Catalog;
use crate::core::delivery::NotificationDelivery;
use crate::core::highlight::highlight;
use crate::core::image_cache::ImageCache;
use crate::core::logger::EventLogger;
use crate::types::{
    ActionType, ComposeOutcome, CounterSnapshot, EventKind, LogEvent, NotificationCategory,
    NotificationPayload, Place, ReasonCode, RegionEvent, RegionEventKind, ResponseAction,
    ResponseOutcome, SessionCounters,
};

/// Build the text of a notification for `place`. No image.
pub fn compose(place: &Place, trigger: RegionEventKind) -> NotificationPayload {
    let description = highlight(&place.kaisetsu, &place.exhibit_keyword);
    let review = highlight(&place.review, &place.place_keyword);

    NotificationPayload {
        place_id: place.name.clone(),
        trigger,
        title: format!("You are at {} now, aren't you?", place.name),
        subtitle: format!("Think of {} while you are here!", place.exhibit_name),
        body: format!(
            "Because the exhibit is described as «{}»,\nand this place is reviewed as «{}». They are related.",
            description, review
        ),
        image_path: None,
        category: NotificationCategory::select(),
        sound: true,
    }
}

/// Turns region and response signals into notifications and tallies
pub struct NotificationComposer {
    catalog: Arc<Catalog>,
    images: ImageCache,
    delivery: Arc<dyn NotificationDelivery>,
    logger: Arc<dyn EventLogger>,
    counters: SessionCounters,
    image_timeout: Duration,
}

impl NotificationComposer {
    pub fn new(
        catalog: Arc<Catalog>,
        images: ImageCache,
        delivery: Arc<dyn NotificationDelivery>,
        logger: Arc<dyn EventLogger>,
        image_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            images,
            delivery,
            logger,
            counters: SessionCounters::new(),
            image_timeout,
        }
    }

    /// Handle one enter/exit/timer signal.
    ///
    /// Unknown region: logged as a mismatch, nothing delivered. Image
    /// trouble: logged, notification sent without the attachment.
    pub async fn on_region_event(&self, event: RegionEvent) -> ComposeOutcome {
        let Some(place) = self.catalog.find(&event.name) else {
            warn!(region = %event.name, kind = %event.kind, "region matches no catalog entry");
            self.logger.append(
                LogEvent::new(EventKind::PlaceMismatch)
                    .with_place(event.name.clone())
                    .with_message(event.kind.to_string()),
            );
            return ComposeOutcome {
                reason: ReasonCode::N002_PLACE_MISMATCH,
                payload: None,
            };
        };

        let mut payload = compose(place, event.kind);
        let mut reason = ReasonCode::N001_NOTIFICATION_SENT;

        match tokio::time::timeout(self.image_timeout, self.images.resolve(&place.exhibit_image)).await {
            Ok(Ok(path)) => payload.image_path = path,
            Ok(Err(e)) => {
                reason = ReasonCode::N003_SENT_WITHOUT_IMAGE;
                self.image_unavailable(place, e.to_string());
            }
            Err(_) => {
                reason = ReasonCode::N003_SENT_WITHOUT_IMAGE;
                self.image_unavailable(place, format!("timed out after {:?}", self.image_timeout));
            }
        }

        self.delivery.deliver(payload.clone());
        self.logger.append(
            LogEvent::new(EventKind::SendNotification)
                .with_place(place.name.clone())
                .with_message(event.kind.to_string()),
        );
        info!(place = %place.name, kind = %event.kind, image = payload.image_path.is_some(), "notification sent");

        ComposeOutcome {
            reason,
            payload: Some(payload),
        }
    }

    /// Handle the visitor's answer to a notification
    pub fn on_response(&self, action_id: &str, original_title: &str) -> ResponseOutcome {
        let (reason, event) = match ResponseAction::parse(action_id) {
            ResponseAction::Useful => {
                self.counters.record_useful();
                (
                    ReasonCode::N004_RESPONSE_RECORDED,
                    LogEvent::new(EventKind::ReceiveNotification)
                        .with_action(ActionType::Useful)
                        .with_place(original_title),
                )
            }
            ResponseAction::Useless => {
                self.counters.record_useless();
                (
                    ReasonCode::N004_RESPONSE_RECORDED,
                    LogEvent::new(EventKind::ReceiveNotification)
                        .with_action(ActionType::Useless)
                        .with_place(original_title),
                )
            }
            ResponseAction::DefaultTap => (
                ReasonCode::N005_RESPONSE_MISTAKE,
                LogEvent::new(EventKind::ReceiveNotification).with_action(ActionType::Mistake),
            ),
            ResponseAction::Unrecognized(id) => {
                warn!(action = %id, "unrecognized response identifier");
                (
                    ReasonCode::N005_RESPONSE_MISTAKE,
                    LogEvent::new(EventKind::ReceiveNotification)
                        .with_action(ActionType::Mistake)
                        .with_message(id),
                )
            }
        };

        self.logger.append(event);
        ResponseOutcome {
            reason,
            counters: self.counters.snapshot(),
        }
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    fn image_unavailable(&self, place: &Place, message: String) {
        warn!(place = %place.name, image = %place.exhibit_image, reason = %message, "sending without image");
        self.logger.append(
            LogEvent::new(EventKind::ImageUnavailable)
                .with_place(place.name.clone())
                .with_message(message),
        );
    }
}

// =============================================================================
// TESTS
// =============================================================================
