//! Proximity ranker: orders the catalog by distance to the visitor
//!
//! Uses squared planar distance in degree space. Only relative order
//! matters, so no square root and no projection.

use std::cmp::Ordering;

use crate::error::PlacenoteError;
use crate::types::{Coordinate, Place};

/// Return the catalog reordered nearest-first.
///
/// Ties (and NaN coordinates, which sort last) are broken by place name
/// then exhibit name, so the order is total and deterministic.
pub fn rank(catalog: &[Place], origin: Option<Coordinate>) -> Result<Vec<Place>, PlacenoteError> {
    let mut keyed = keyed(catalog, origin)?;
    keyed.sort_by(|(da, a), (db, b)| compare(*da, a, *db, b));

    Ok(keyed.into_iter().map(|(_, place)| place.clone()).collect())
}

/// The first `k` entries of [`rank`]. Only those `k` places are cloned.
pub fn top_k(catalog: &[Place], origin: Option<Coordinate>, k: usize) -> Result<Vec<Place>, PlacenoteError> {
    let mut keyed = keyed(catalog, origin)?;
    if k == 0 {
        return Ok(Vec::new());
    }
    if k < keyed.len() {
        keyed.select_nth_unstable_by(k - 1, |(da, a), (db, b)| compare(*da, a, *db, b));
        keyed.truncate(k);
    }
    keyed.sort_by(|(da, a), (db, b)| compare(*da, a, *db, b));

    Ok(keyed.into_iter().map(|(_, place)| place.clone()).collect())
}

/// Borrowed (distance, place) pairs; refuses an unusable origin
fn keyed(catalog: &[Place], origin: Option<Coordinate>) -> Result<Vec<(f64, &Place)>, PlacenoteError> {
    let origin = origin
        .filter(Coordinate::is_usable)
        .ok_or(PlacenoteError::OriginUnavailable)?;

    Ok(catalog
        .iter()
        .map(|place| (sort_key(place.coordinate().squared_distance(&origin)), place))
        .collect())
}

/// Unplottable places go last
fn sort_key(distance: f64) -> f64 {
    if distance.is_nan() {
        f64::INFINITY
    } else {
        distance
    }
}

fn compare(da: f64, a: &Place, db: f64, b: &Place) -> Ordering {
    da.total_cmp(&db)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.exhibit_name.cmp(&b.exhibit_name))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn place(name: &str, lat: f64, lng: f64) -> Place {
        Place {
            name: name.to_string(),
            lat,
            lng,
            review: String::new(),
            place_keyword: String::new(),
            exhibit_name: format!("{} exhibit", name),
            exhibit_id: String::new(),
            exhibit_keyword: String::new(),
            exhibit_image: String::new(),
            kaisetsu: String::new(),
        }
    }

    fn names(places: &[Place]) -> Vec<&str> {
        places.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_ascending_squared_distance() {
        // squared distances 1, 4, 9 from the origin
        let catalog = vec![place("a", 1.0, 0.0), place("b", 0.0, 2.0), place("c", 3.0, 0.0)];
        let ranked = rank(&catalog, Some(Coordinate::new(0.0, 0.0))).unwrap();
        assert_eq!(names(&ranked), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reorders_unsorted_catalog() {
        let catalog = vec![place("far", 5.0, 5.0), place("near", 0.1, 0.1), place("mid", 1.0, 1.0)];
        let ranked = rank(&catalog, Some(Coordinate::new(0.0, 0.0))).unwrap();
        assert_eq!(names(&ranked), vec!["near", "mid", "far"]);
    }

    #[test]
    fn test_ties_are_deterministic() {
        let catalog = vec![place("z", 1.0, 0.0), place("y", -1.0, 0.0), place("x", 0.0, 1.0)];
        let origin = Some(Coordinate::new(0.0, 0.0));
        let first = rank(&catalog, origin).unwrap();
        let second = rank(&catalog, origin).unwrap();
        assert_eq!(names(&first), vec!["x", "y", "z"]);
        assert_eq!(names(&first), names(&second));
    }

    #[test]
    fn test_nan_place_does_not_crash() {
        let catalog = vec![place("broken", f64::NAN, 0.0), place("ok", 1.0, 1.0)];
        let ranked = rank(&catalog, Some(Coordinate::new(0.0, 0.0))).unwrap();
        assert_eq!(names(&ranked), vec!["ok", "broken"]);
    }

    #[test]
    fn test_missing_origin_refused() {
        let catalog = vec![place("a", 1.0, 0.0)];
        assert!(matches!(rank(&catalog, None), Err(PlacenoteError::OriginUnavailable)));
        assert!(matches!(
            rank(&catalog, Some(Coordinate::new(f64::NAN, 0.0))),
            Err(PlacenoteError::OriginUnavailable)
        ));
    }

    #[test]
    fn test_top_k_truncates() {
        let catalog: Vec<Place> = (0..30).map(|i| place(&format!("p{:02}", i), i as f64, 0.0)).collect();
        let top = top_k(&catalog, Some(Coordinate::new(0.0, 0.0)), 20).unwrap();
        assert_eq!(top.len(), 20);
        assert_eq!(top[0].name, "p00");
        assert_eq!(top[19].name, "p19");
    }

    #[test]
    fn test_top_k_is_prefix_of_full_rank() {
        // Scrambled grid with many equal distances
        let catalog: Vec<Place> = (0..200)
            .map(|i| place(&format!("g{:03}", (i * 37) % 200), ((i * 7) % 11) as f64 - 5.0, ((i * 3) % 13) as f64 - 6.0))
            .collect();
        let origin = Some(Coordinate::new(0.5, -0.5));
        let full = rank(&catalog, origin).unwrap();

        for k in [0, 1, 19, 20, 199, 200, 500] {
            let top = top_k(&catalog, origin, k).unwrap();
            assert_eq!(names(&top), names(&full[..k.min(full.len())]), "k = {}", k);
        }
    }
}
