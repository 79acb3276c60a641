//! Working-set differ: which regions to stop, which to start
//!
//! Membership is by (name, exhibit name) identity, never by position, so a
//! place that only changes rank inside the top-K produces nothing.

use std::collections::HashSet;

use crate::types::{Place, PlaceIdentity, WorkingSetDiff};

/// Members of `previous` whose identity is absent from `next`
pub fn to_stop(previous: &[Place], next: &[Place]) -> Vec<Place> {
    absent_from(previous, next)
}

/// Members of `next` whose identity is absent from `previous`
pub fn to_start(previous: &[Place], next: &[Place]) -> Vec<Place> {
    absent_from(next, previous)
}

/// Both passes at once. The manager calls the two halves separately so
/// stops are applied before starts are computed.
pub fn diff(previous: &[Place], next: &[Place]) -> WorkingSetDiff {
    WorkingSetDiff {
        to_stop: to_stop(previous, next),
        to_start: to_start(previous, next),
    }
}

fn absent_from(source: &[Place], other: &[Place]) -> Vec<Place> {
    let present: HashSet<PlaceIdentity> = other.iter().map(Place::identity).collect();
    let mut seen: HashSet<PlaceIdentity> = HashSet::new();

    source
        .iter()
        .filter(|place| {
            let id = place.identity();
            !present.contains(&id) && seen.insert(id)
        })
        .cloned()
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
