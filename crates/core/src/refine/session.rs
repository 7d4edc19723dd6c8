use crate::hazard::DetectionCache;

/// State that outlives a single run: vision answers for turns already checked.
///
/// Each session is handed to one run at a time by `&mut`.
#[derive(Debug, Default)]
pub struct RefinementSession {
    pub detection_cache: DetectionCache,
}

impl RefinementSession {
    pub fn new() -> Self {
        Self::default()
    }
}
