use std::collections::HashMap;

use detour_geometry::GeoPoint;

/// Decimal places of the turn coordinate used as cache key (about one metre)
pub const CACHE_KEY_DECIMALS: u32 = 5;

/// Vision answers keyed by turn point.
///
/// Stop signs do not move, so entries live as long as the session that owns
/// the cache. Only definitive answers belong here.
#[derive(Clone, Debug, Default)]
pub struct DetectionCache {
    entries: HashMap<(i64, i64), bool>,
}

impl DetectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, turn: GeoPoint) -> Option<bool> {
        self.entries.get(&turn.rounded_key(CACHE_KEY_DECIMALS)).copied()
    }

    pub fn insert(&mut self, turn: GeoPoint, detected: bool) {
        self.entries
            .insert(turn.rounded_key(CACHE_KEY_DECIMALS), detected);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of cached positive detections
    pub fn detected_count(&self) -> usize {
        self.entries.values().filter(|&&detected| detected).count()
    }
}
