//! Stop-sign hazards ahead of sharp left turns.

pub mod cache;
pub mod detect;

pub use cache::DetectionCache;
pub use detect::{detect_hazards, is_sharp_left, turn_candidates, HazardSettings, TurnCandidate};

use std::collections::HashSet;

use crate::model::HazardZone;

/// Zones whose turn points are closer than this are the same hazard
pub const DUPLICATE_DISTANCE_M: f64 = 20.0;

/// Decimal places of the box-center key (about ten metres)
pub const CENTER_KEY_DECIMALS: u32 = 4;

/// Add the zones of `incoming` that are not already in `existing`, returning
/// how many were added
pub fn merge_hazards(
    existing: &mut Vec<HazardZone>,
    incoming: impl IntoIterator<Item = HazardZone>,
) -> usize {
    let mut centers: HashSet<(i64, i64)> = existing
        .iter()
        .map(|zone| zone.bounding_box.center().rounded_key(CENTER_KEY_DECIMALS))
        .collect();
    let before = existing.len();

    for zone in incoming {
        let key = zone.bounding_box.center().rounded_key(CENTER_KEY_DECIMALS);
        let nearby = existing
            .iter()
            .any(|kept| kept.location.distance_to(zone.location) < DUPLICATE_DISTANCE_M);
        if nearby || !centers.insert(key) {
            continue;
        }
        existing.push(zone);
    }

    existing.len() - before
}

/// First zone of every cluster, in input order
pub fn dedup_hazards(zones: impl IntoIterator<Item = HazardZone>) -> Vec<HazardZone> {
    let mut kept = Vec::new();
    merge_hazards(&mut kept, zones);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use detour_geometry::GeoPoint;

    #[test]
    fn test_close_hazards_collapse() {
        let a = HazardZone::new(GeoPoint::new(45.0, 7.0), 90.0, 20.0);
        let b = HazardZone::new(GeoPoint::new(45.0001, 7.0001), 90.0, 20.0);
        let far = HazardZone::new(GeoPoint::new(45.01, 7.0), 90.0, 20.0);

        let kept = dedup_hazards([a, b, far]);
        assert_eq!(kept, vec![a, far]);
    }

    #[test]
    fn test_merge_counts_new_zones() {
        let mut existing = vec![HazardZone::new(GeoPoint::new(45.0, 7.0), 90.0, 20.0)];
        let added = merge_hazards(
            &mut existing,
            [
                HazardZone::new(GeoPoint::new(45.00005, 7.0), 90.0, 20.0),
                HazardZone::new(GeoPoint::new(45.002, 7.0), 90.0, 20.0),
            ],
        );
        assert_eq!(added, 1);
        assert_eq!(existing.len(), 2);
    }
}
