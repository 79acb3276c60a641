//! Working-set manager: keeps the nearest K places subscribed as regions
//!
//! Each location update:
//! - ranks the whole catalog against the new position
//! - stops regions that fell out of the top-K (against the old top-K)
//! - then starts regions that entered it (against the new top-K)
//!
//! Gateway refusals leave the entry as it was; the next update's diff
//! retries it. No error escapes the public operations.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::catalog::Catalog;
use crate::core::differ;
use crate::core::gateway::RegionGateway;
use crate::core::logger::EventLogger;
use crate::core::ranker;
use crate::error::PlacenoteError;
use crate::types::{Coordinate, EventKind, LogEvent, Place, ReasonCode, RegionEvent, UpdateOutcome};
use crate::{REGION_CAPACITY, REGION_RADIUS_METERS};

/// Owner of the working set and the only caller of the gateway.
///
/// Not `Sync` by use: exactly one task drives it (see `service`).
pub struct WorkingSetManager<G: RegionGateway> {
    catalog: Arc<Catalog>,
    gateway: G,
    logger: Arc<dyn EventLogger>,
    /// Places believed subscribed, in admission order
    working_set: Vec<Place>,
    /// Last usable position
    last_origin: Option<Coordinate>,
    /// Number of location updates received
    update_count: u64,
}

impl<G: RegionGateway> std::fmt::Debug for WorkingSetManager<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkingSetManager")
            .field("working_set", &self.working_set_names())
            .field("last_origin", &self.last_origin)
            .field("update_count", &self.update_count)
            .finish()
    }
}

impl<G: RegionGateway> WorkingSetManager<G> {
    /// Create a manager with an empty working set
    pub fn new(catalog: Arc<Catalog>, gateway: G, logger: Arc<dyn EventLogger>) -> Self {
        Self {
            catalog,
            gateway,
            logger,
            working_set: Vec::new(),
            last_origin: None,
            update_count: 0,
        }
    }

    /// Clear stale platform regions, then admit the first K catalog
    /// entries in catalog order. Used before the first position fix.
    pub fn bootstrap(&mut self) -> UpdateOutcome {
        let reset = self.reset_all();

        let seed: Vec<Place> = self.catalog.places().iter().take(REGION_CAPACITY).cloned().collect();
        let mut outcome = UpdateOutcome::new(ReasonCode::G005_SEEDED, 0);
        outcome.stopped = reset.stopped;
        outcome.failed = reset.failed;
        for place in seed {
            self.admit(place, &mut outcome);
        }

        if !outcome.failed.is_empty() {
            outcome.reason = ReasonCode::G003_GATEWAY_PARTIAL;
        }
        outcome.working_set_len = self.working_set.len();
        info!(regions = outcome.working_set_len, "working set seeded");
        outcome
    }

    /// Re-rank, diff against the current working set, apply.
    pub fn on_location_update(&mut self, origin: Option<Coordinate>) -> UpdateOutcome {
        self.update_count += 1;

        let new_top = match ranker::top_k(self.catalog.places(), origin, REGION_CAPACITY) {
            Ok(top) => top,
            Err(e) => {
                warn!(error = %e, "location update refused");
                self.logger.append(
                    LogEvent::new(EventKind::OriginUnavailable).with_message(e.to_string()),
                );
                return UpdateOutcome::new(ReasonCode::G002_ORIGIN_UNAVAILABLE, self.working_set.len());
            }
        };
        self.last_origin = origin;

        let previous: Vec<Place> = self.working_set.iter().take(REGION_CAPACITY).cloned().collect();
        let mut outcome = UpdateOutcome::new(ReasonCode::G001_NO_CHANGE, 0);

        // Free slots first
        for place in differ::to_stop(&previous, &new_top) {
            self.evict(&place, &mut outcome);
        }

        for place in differ::to_start(&previous, &new_top) {
            self.admit(place, &mut outcome);
        }

        outcome.reason = if !outcome.failed.is_empty() {
            ReasonCode::G003_GATEWAY_PARTIAL
        } else if outcome.started.is_empty() && outcome.stopped.is_empty() {
            ReasonCode::G001_NO_CHANGE
        } else {
            ReasonCode::G001_DIFF_APPLIED
        };
        outcome.working_set_len = self.working_set.len();

        debug!(
            update = self.update_count,
            started = outcome.started.len(),
            stopped = outcome.stopped.len(),
            failed = outcome.failed.len(),
            regions = outcome.working_set_len,
            "diff applied"
        );
        outcome
    }

    /// Stop every region the gateway reports as monitored and empty the
    /// working set. Idempotent.
    pub fn reset_all(&mut self) -> UpdateOutcome {
        let mut outcome = UpdateOutcome::new(ReasonCode::G004_RESET, 0);

        for name in self.gateway.currently_monitored_names() {
            match self.gateway.stop_monitoring(&name) {
                Ok(()) => outcome.stopped.push(name),
                Err(e) => self.record_failure(&name, &e, &mut outcome),
            }
        }

        // Refused single stops get one sweep over everything
        if !outcome.failed.is_empty() {
            match self.gateway.stop_all_monitoring() {
                Ok(()) => {
                    let swept = std::mem::take(&mut outcome.failed);
                    outcome.stopped.extend(swept);
                }
                Err(e) => warn!(error = %e, "stop-all sweep failed"),
            }
        }

        // Anything the gateway still holds stays tracked so it is not
        // started twice later.
        let failed = &outcome.failed;
        self.working_set.retain(|p| failed.contains(&p.name));
        outcome.working_set_len = self.working_set.len();

        self.logger.append(
            LogEvent::new(EventKind::Reset).with_message(format!("{} regions stopped", outcome.stopped.len())),
        );
        info!(stopped = outcome.stopped.len(), "all regions reset");
        outcome
    }

    /// Pass a position to the gateway and collect the region signals it
    /// raises. Does not touch the working set.
    pub fn observe(&mut self, position: Coordinate) -> Vec<RegionEvent> {
        self.gateway.observe_position(position)
    }

    fn admit(&mut self, place: Place, outcome: &mut UpdateOutcome) {
        if self.working_set.iter().any(|p| p.name == place.name) {
            return;
        }
        if self.working_set.len() >= REGION_CAPACITY {
            // Held by regions whose stop failed; retried next update
            debug!(place = %place.name, "no free region slot");
            return;
        }

        // Survived a refused reset; tracked again, not started twice
        if self.gateway.currently_monitored_names().contains(&place.name) {
            debug!(place = %place.name, "region already monitored, adopted");
            self.working_set.push(place);
            return;
        }

        match self
            .gateway
            .start_monitoring(&place.name, place.coordinate(), REGION_RADIUS_METERS)
        {
            Ok(()) => {
                outcome.started.push(place.name.clone());
                self.working_set.push(place);
            }
            Err(e) => self.record_failure(&place.name, &e, outcome),
        }
    }

    fn evict(&mut self, place: &Place, outcome: &mut UpdateOutcome) {
        match self.gateway.stop_monitoring(&place.name) {
            Ok(()) => {
                self.working_set.retain(|p| !p.same_identity(place));
                outcome.stopped.push(place.name.clone());
            }
            Err(e) => self.record_failure(&place.name, &e, outcome),
        }
    }

    fn record_failure(&self, name: &str, error: &PlacenoteError, outcome: &mut UpdateOutcome) {
        warn!(region = name, error = %error, "gateway request failed");
        self.logger.append(
            LogEvent::new(EventKind::GatewayFailure)
                .with_place(name)
                .with_message(error.to_string()),
        );
        outcome.failed.push(name.to_string());
    }

    /// Places currently believed subscribed
    pub fn working_set(&self) -> &[Place] {
        &self.working_set
    }

    /// Names of the working set
    pub fn working_set_names(&self) -> BTreeSet<String> {
        self.working_set.iter().map(|p| p.name.clone()).collect()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn last_origin(&self) -> Option<Coordinate> {
        self.last_origin
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }
}

// =============================================================================
// TESTS
// =============================================================================
