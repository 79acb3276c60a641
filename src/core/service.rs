//! Serialized Placenote service
//!
//! One task owns the working-set manager and handles its commands in
//! arrival order, so at most one mutation of the working set is ever in
//! flight and a reset queued behind an update runs after it. Region and
//! response signals go to the composer on their own tasks.

use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::composer::NotificationComposer;
use crate::core::gateway::RegionGateway;
use crate::core::logger::EventLogger;
use crate::core::working_set::WorkingSetManager;
use crate::error::PlacenoteError;
use crate::types::{
    ComposeOutcome, Coordinate, CounterSnapshot, EventKind, LogEvent, ReasonCode, RegionEvent,
    RegionEventKind, ResponseOutcome, UpdateOutcome,
};

/// Queue depth of the manager command channel
const COMMAND_BUFFER: usize = 64;

/// Capacity of the update broadcast
const UPDATE_BROADCAST: usize = 100;

/// Requests handled by the manager task
#[derive(Debug)]
enum ManagerCommand {
    Location {
        origin: Option<Coordinate>,
        reply: oneshot::Sender<(UpdateOutcome, Vec<RegionEvent>)>,
    },
    Reset {
        reply: oneshot::Sender<UpdateOutcome>,
    },
    Bootstrap {
        reply: oneshot::Sender<UpdateOutcome>,
    },
    Status {
        reply: oneshot::Sender<ManagerStatus>,
    },
}

#[derive(Debug)]
struct ManagerStatus {
    names: BTreeSet<String>,
    monitored: BTreeSet<String>,
    last_origin: Option<Coordinate>,
    update_count: u64,
}

/// Result of a location update as seen by a caller
#[derive(Debug)]
pub struct LocationReport {
    pub outcome: UpdateOutcome,
    /// Region signals raised by the new position
    pub events: Vec<RegionEvent>,
    /// One composer task per signal
    pub triggered: Vec<JoinHandle<ComposeOutcome>>,
}

/// Working set and tallies, for presentation layers
#[derive(Debug, Clone, Serialize)]
pub struct WorkingSetStatus {
    /// Places the manager believes subscribed
    pub working_set: BTreeSet<String>,
    /// Regions the gateway reports as monitored
    pub monitored: BTreeSet<String>,
    pub last_origin: Option<Coordinate>,
    pub update_count: u64,
    pub counters: CounterSnapshot,
}

impl WorkingSetStatus {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let origin = self
            .last_origin
            .map(|o| o.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "\x1b[36mregions={}\x1b[0m | monitored={} | updates={} | origin={} | \x1b[32museful={}\x1b[0m \x1b[31museless={}\x1b[0m\n  {}",
            self.working_set.len(),
            self.monitored.len(),
            self.update_count,
            origin,
            self.counters.useful,
            self.counters.useless,
            self.working_set.iter().cloned().collect::<Vec<_>>().join(", ")
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "regions={} | monitored={} | updates={} | useful={} | useless={} | names={}",
            self.working_set.len(),
            self.monitored.len(),
            self.update_count,
            self.counters.useful,
            self.counters.useless,
            self.working_set.iter().cloned().collect::<Vec<_>>().join(",")
        )
    }
}

/// Handle to a running Placenote service
pub struct PlacenoteService {
    commands: mpsc::Sender<ManagerCommand>,
    composer: Arc<NotificationComposer>,
    updates: broadcast::Sender<UpdateOutcome>,
    manager_task: JoinHandle<()>,
}

impl PlacenoteService {
    /// Move the manager onto its own task and log the start.
    /// Must be called inside a tokio runtime.
    pub fn spawn<G>(
        manager: WorkingSetManager<G>,
        composer: NotificationComposer,
        logger: Arc<dyn EventLogger>,
    ) -> Self
    where
        G: RegionGateway + 'static,
    {
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let (updates, _) = broadcast::channel(UPDATE_BROADCAST);

        let manager_task = tokio::spawn(run_manager(manager, rx, updates.clone()));

        logger.append(LogEvent::new(EventKind::AppStarted));
        info!(version = crate::VERSION, "placenote service started");

        Self {
            commands,
            composer: Arc::new(composer),
            updates,
            manager_task,
        }
    }

    /// Clear stale regions and seed the first K catalog entries
    pub async fn bootstrap(&self) -> Result<UpdateOutcome, PlacenoteError> {
        let (reply, rx) = oneshot::channel();
        self.send(ManagerCommand::Bootstrap { reply }).await?;
        rx.await.map_err(|_| PlacenoteError::ServiceClosed)
    }

    /// Apply a new visitor position. Region signals it raises are handed
    /// to the composer before this returns.
    pub async fn location_update(&self, origin: Option<Coordinate>) -> Result<LocationReport, PlacenoteError> {
        let (reply, rx) = oneshot::channel();
        self.send(ManagerCommand::Location { origin, reply }).await?;
        let (outcome, events) = rx.await.map_err(|_| PlacenoteError::ServiceClosed)?;

        let triggered = events.iter().cloned().map(|e| self.region_event(e)).collect();
        Ok(LocationReport {
            outcome,
            events,
            triggered,
        })
    }

    /// Stop every region. Resolves once the reset has been applied, after
    /// any update queued before it.
    pub async fn reset_all(&self) -> Result<UpdateOutcome, PlacenoteError> {
        let (reply, rx) = oneshot::channel();
        self.send(ManagerCommand::Reset { reply }).await?;
        rx.await.map_err(|_| PlacenoteError::ServiceClosed)
    }

    /// Compose a notification for one region signal on a separate task
    pub fn region_event(&self, event: RegionEvent) -> JoinHandle<ComposeOutcome> {
        let composer = Arc::clone(&self.composer);
        tokio::spawn(async move { composer.on_region_event(event).await })
    }

    /// Record the visitor's answer to a notification
    pub fn response(&self, action_id: &str, original_title: &str) -> ResponseOutcome {
        self.composer.on_response(action_id, original_title)
    }

    pub async fn status(&self) -> Result<WorkingSetStatus, PlacenoteError> {
        let (reply, rx) = oneshot::channel();
        self.send(ManagerCommand::Status { reply }).await?;
        let status = rx.await.map_err(|_| PlacenoteError::ServiceClosed)?;

        Ok(WorkingSetStatus {
            working_set: status.names,
            monitored: status.monitored,
            last_origin: status.last_origin,
            update_count: status.update_count,
            counters: self.composer.counters(),
        })
    }

    /// Every outcome the manager produces, as it produces it
    pub fn subscribe(&self) -> broadcast::Receiver<UpdateOutcome> {
        self.updates.subscribe()
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.composer.counters()
    }

    /// Periodically notify about one catalog place, independent of
    /// position. Places come from a shuffled copy of the catalog and wrap
    /// around. The first notification fires one `period` after the call.
    pub fn spawn_timer_feed(&self, period: Duration) -> JoinHandle<()> {
        let mut order: Vec<String> = self
            .composer
            .catalog()
            .places()
            .iter()
            .map(|p| p.name.clone())
            .collect();
        order.shuffle(&mut rand::thread_rng());

        let composer = Arc::clone(&self.composer);
        tokio::spawn(async move {
            if order.is_empty() {
                return;
            }
            let mut ticker = tokio::time::interval(period);
            // First tick completes immediately
            ticker.tick().await;

            for name in order.iter().cycle() {
                ticker.tick().await;
                debug!(place = %name, "timer feed");
                composer
                    .on_region_event(RegionEvent::new(RegionEventKind::Timer, name.clone()))
                    .await;
            }
        })
    }

    /// Close the command channel and wait for the manager to drain it
    pub async fn shutdown(self) {
        drop(self.commands);
        let _ = self.manager_task.await;
        info!("placenote service stopped");
    }

    async fn send(&self, command: ManagerCommand) -> Result<(), PlacenoteError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlacenoteError::ServiceClosed)
    }
}

async fn run_manager<G: RegionGateway>(
    mut manager: WorkingSetManager<G>,
    mut rx: mpsc::Receiver<ManagerCommand>,
    updates: broadcast::Sender<UpdateOutcome>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            ManagerCommand::Location { origin, reply } => {
                let outcome = manager.on_location_update(origin);
                let events = match origin {
                    Some(position) if outcome.reason != ReasonCode::G002_ORIGIN_UNAVAILABLE => {
                        manager.observe(position)
                    }
                    _ => Vec::new(),
                };
                let _ = updates.send(outcome.clone());
                let _ = reply.send((outcome, events));
            }
            ManagerCommand::Reset { reply } => {
                let outcome = manager.reset_all();
                let _ = updates.send(outcome.clone());
                let _ = reply.send(outcome);
            }
            ManagerCommand::Bootstrap { reply } => {
                let outcome = manager.bootstrap();
                let _ = updates.send(outcome.clone());
                let _ = reply.send(outcome);
            }
            ManagerCommand::Status { reply } => {
                let _ = reply.send(ManagerStatus {
                    names: manager.working_set_names(),
                    monitored: manager.gateway().currently_monitored_names(),
                    last_origin: manager.last_origin(),
                    update_count: manager.update_count(),
                });
            }
        }
    }
    debug!("manager command channel closed");
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Catalog;
    use crate::core::delivery::MemoryDelivery;
    use crate::core::gateway::SimulatedGateway;
    use crate::core::image_cache::{ImageCache, ImageFetcher};
    use crate::core::logger::MemoryEventLogger;
    use crate::types::Place;
    use async_trait::async_trait;

    struct NoFetch;

    #[async_trait]
    impl ImageFetcher for NoFetch {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, PlacenoteError> {
            Err(PlacenoteError::image_fetch(url, "offline"))
        }
    }

    fn place(name: &str, lat: f64, lng: f64) -> Place {
        Place {
            name: name.to_string(),
            lat,
            lng,
            review: String::new(),
            place_keyword: String::new(),
            exhibit_name: "exhibit".to_string(),
            exhibit_id: String::new(),
            exhibit_keyword: String::new(),
            exhibit_image: String::new(),
            kaisetsu: String::new(),
        }
    }

    fn service(places: Vec<Place>) -> (PlacenoteService, Arc<MemoryDelivery>, Arc<MemoryEventLogger>) {
        let catalog = Arc::new(Catalog::from_places(places).unwrap());
        let logger = Arc::new(MemoryEventLogger::new());
        let delivery = Arc::new(MemoryDelivery::new());
        let manager = WorkingSetManager::new(catalog.clone(), SimulatedGateway::new(), logger.clone());
        let composer = NotificationComposer::new(
            catalog,
            ImageCache::new(std::env::temp_dir().join("placenote-service-tests"), Arc::new(NoFetch)),
            delivery.clone(),
            logger.clone(),
            Duration::from_millis(100),
        );
        let svc = PlacenoteService::spawn(manager, composer, logger.clone());
        (svc, delivery, logger)
    }

    #[tokio::test]
    async fn test_start_logs_app_started() {
        let (svc, _, logger) = service(vec![place("A", 0.0, 0.0)]);
        assert_eq!(logger.count(EventKind::AppStarted), 1);
        svc.shutdown().await;
    }

    #[tokio::test]
    async fn test_location_update_triggers_enter() {
        let (svc, delivery, _) = service(vec![place("A", 35.0, 139.0), place("B", 36.0, 140.0)]);

        let report = svc.location_update(Some(Coordinate::new(35.0, 139.0))).await.unwrap();
        assert_eq!(report.outcome.reason, ReasonCode::G001_DIFF_APPLIED);
        assert_eq!(report.events, vec![RegionEvent::new(RegionEventKind::Enter, "A")]);

        for handle in report.triggered {
            let outcome = handle.await.unwrap();
            assert_eq!(outcome.reason, ReasonCode::N001_NOTIFICATION_SENT);
        }
        assert_eq!(delivery.delivered().len(), 1);
        assert_eq!(delivery.delivered()[0].place_id, "A");
        svc.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_origin_raises_no_events() {
        let (svc, _, logger) = service(vec![place("A", 35.0, 139.0)]);

        let report = svc.location_update(None).await.unwrap();
        assert_eq!(report.outcome.reason, ReasonCode::G002_ORIGIN_UNAVAILABLE);
        assert!(report.events.is_empty());
        assert_eq!(logger.count(EventKind::OriginUnavailable), 1);
        svc.shutdown().await;
    }

    #[tokio::test]
    async fn test_status_reports_counters() {
        let (svc, _, _) = service(vec![place("A", 35.0, 139.0)]);

        svc.location_update(Some(Coordinate::new(10.0, 10.0))).await.unwrap();
        svc.response(crate::ACTION_USEFUL_ID, "title");

        let status = svc.status().await.unwrap();
        assert_eq!(status.working_set, BTreeSet::from(["A".to_string()]));
        assert_eq!(status.monitored, status.working_set);
        assert_eq!(status.update_count, 1);
        assert_eq!(status.counters, CounterSnapshot { useful: 1, useless: 0 });
        svc.shutdown().await;
    }

    #[tokio::test]
    async fn test_subscribers_see_outcomes() {
        let (svc, _, _) = service(vec![place("A", 35.0, 139.0)]);
        let mut rx = svc.subscribe();

        svc.bootstrap().await.unwrap();
        svc.reset_all().await.unwrap();

        assert_eq!(rx.recv().await.unwrap().reason, ReasonCode::G005_SEEDED);
        assert_eq!(rx.recv().await.unwrap().reason, ReasonCode::G004_RESET);
        svc.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_feed_cycles_catalog() {
        let (svc, delivery, _) = service(vec![place("A", 0.0, 0.0), place("B", 1.0, 1.0)]);

        let feed = svc.spawn_timer_feed(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(45)).await;
        feed.abort();

        let delivered = delivery.delivered();
        assert_eq!(delivered.len(), 4);
        assert!(delivered.iter().all(|p| p.trigger == RegionEventKind::Timer));
        // Wrap-around repeats the shuffled order
        assert_eq!(delivered[0].place_id, delivered[2].place_id);
        assert_eq!(delivered[1].place_id, delivered[3].place_id);
        assert_ne!(delivered[0].place_id, delivered[1].place_id);
        svc.shutdown().await;
    }
}
