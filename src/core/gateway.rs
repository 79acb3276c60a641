//! Region subscription gateway
//!
//! The only seam that talks to the platform's region-monitoring
//! primitive. The manager sends "start name/lat/lng" and "stop name" and
//! never holds platform region objects.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::PlacenoteError;
use crate::types::{Coordinate, RegionEvent, RegionEventKind};

/// Platform region monitoring, as seen by the working-set manager
pub trait RegionGateway: Send {
    /// Begin monitoring a circular region identified by `name`
    fn start_monitoring(&mut self, name: &str, center: Coordinate, radius_meters: f64) -> Result<(), PlacenoteError>;

    /// Stop monitoring the region identified by `name`
    fn stop_monitoring(&mut self, name: &str) -> Result<(), PlacenoteError>;

    /// Stop everything the platform monitors for this process
    fn stop_all_monitoring(&mut self) -> Result<(), PlacenoteError>;

    /// Identifiers of every region currently monitored
    fn currently_monitored_names(&self) -> BTreeSet<String>;

    /// Feed a new visitor position to the platform and collect the
    /// enter/exit signals it raises. Real platforms deliver these on
    /// their own; the default reports none.
    fn observe_position(&mut self, _position: Coordinate) -> Vec<RegionEvent> {
        Vec::new()
    }
}

/// A call the gateway received, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Start(String),
    Stop(String),
    StopAll,
}

#[derive(Debug, Clone)]
struct SimRegion {
    center: Coordinate,
    radius_meters: f64,
    inside: bool,
}

/// In-memory platform stand-in.
///
/// Plays both the monitoring primitive and the region event source:
/// `observe_position` reports enter/exit transitions by great-circle
/// distance to each monitored center.
#[derive(Debug, Default)]
pub struct SimulatedGateway {
    regions: BTreeMap<String, SimRegion>,
    history: Vec<GatewayCall>,
}

impl SimulatedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every start/stop received so far
    pub fn history(&self) -> &[GatewayCall] {
        &self.history
    }

    /// Forget recorded calls, keep regions
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn is_monitoring(&self, name: &str) -> bool {
        self.regions.contains_key(name)
    }
}

impl RegionGateway for SimulatedGateway {
    fn start_monitoring(&mut self, name: &str, center: Coordinate, radius_meters: f64) -> Result<(), PlacenoteError> {
        if self.regions.contains_key(name) {
            return Err(PlacenoteError::gateway(name, "region already monitored"));
        }
        self.history.push(GatewayCall::Start(name.to_string()));
        self.regions.insert(
            name.to_string(),
            SimRegion {
                center,
                radius_meters,
                inside: false,
            },
        );
        Ok(())
    }

    fn stop_monitoring(&mut self, name: &str) -> Result<(), PlacenoteError> {
        self.history.push(GatewayCall::Stop(name.to_string()));
        self.regions.remove(name);
        Ok(())
    }

    fn stop_all_monitoring(&mut self) -> Result<(), PlacenoteError> {
        self.history.push(GatewayCall::StopAll);
        self.regions.clear();
        Ok(())
    }

    fn currently_monitored_names(&self) -> BTreeSet<String> {
        self.regions.keys().cloned().collect()
    }

    fn observe_position(&mut self, position: Coordinate) -> Vec<RegionEvent> {
        let mut events = Vec::new();
        for (name, region) in self.regions.iter_mut() {
            let inside = region.center.distance_meters(&position) <= region.radius_meters;
            if inside != region.inside {
                let kind = if inside {
                    RegionEventKind::Enter
                } else {
                    RegionEventKind::Exit
                };
                events.push(RegionEvent::new(kind, name.clone()));
                region.inside = inside;
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::REGION_RADIUS_METERS;

    #[test]
    fn test_start_stop_tracks_names() {
        let mut gateway = SimulatedGateway::new();
        gateway.start_monitoring("a", Coordinate::new(35.0, 139.0), REGION_RADIUS_METERS).unwrap();
        gateway.start_monitoring("b", Coordinate::new(35.1, 139.0), REGION_RADIUS_METERS).unwrap();
        gateway.stop_monitoring("a").unwrap();

        let names: Vec<String> = gateway.currently_monitored_names().into_iter().collect();
        assert_eq!(names, vec!["b".to_string()]);
        assert_eq!(gateway.history().len(), 3);
    }

    #[test]
    fn test_double_start_refused() {
        let mut gateway = SimulatedGateway::new();
        let center = Coordinate::new(35.0, 139.0);
        gateway.start_monitoring("a", center, REGION_RADIUS_METERS).unwrap();
        assert!(gateway.start_monitoring("a", center, REGION_RADIUS_METERS).is_err());
    }

    #[test]
    fn test_enter_then_exit() {
        let mut gateway = SimulatedGateway::new();
        let center = Coordinate::new(35.0, 139.0);
        gateway.start_monitoring("hall", center, REGION_RADIUS_METERS).unwrap();

        let far = Coordinate::new(35.01, 139.0); // ~1.1 km north
        assert!(gateway.observe_position(far).is_empty());

        let events = gateway.observe_position(Coordinate::new(35.0003, 139.0)); // ~33 m
        assert_eq!(events, vec![RegionEvent::new(RegionEventKind::Enter, "hall")]);

        // Staying inside raises nothing new
        assert!(gateway.observe_position(center).is_empty());

        let events = gateway.observe_position(far);
        assert_eq!(events, vec![RegionEvent::new(RegionEventKind::Exit, "hall")]);
    }
}
