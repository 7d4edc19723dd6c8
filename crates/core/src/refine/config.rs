use std::time::Duration;

use crate::hazard::HazardSettings;
use crate::scoring::ScoringSettings;

/// Tunables for one refinement run
#[derive(Clone, Debug, PartialEq)]
pub struct RefinementConfig {
    pub max_iterations: u32,
    /// Jam factor (0 to 10) at or above which a road counts as congested
    pub jam_threshold: f64,
    /// Upper bound on segment ids sent in one avoid request
    pub max_avoid_segments: usize,
    pub match_threshold_m: f64,
    pub hazard_radius_m: f64,
    pub vantage_distance_m: f64,
    pub sharp_turn_angle: f64,
    pub vision_confidence: f64,
    pub vision_concurrency: usize,
    /// Alternatives requested besides the primary route
    pub alternatives: u32,
    pub hazard_proximity_m: f64,
    pub stop_sign_penalty_s: f64,
    pub routing_timeout: Duration,
    pub traffic_timeout: Duration,
    pub vision_timeout: Duration,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            jam_threshold: 5.0,
            max_avoid_segments: 250,
            match_threshold_m: 20.0,
            hazard_radius_m: 20.0,
            vantage_distance_m: 40.0,
            sharp_turn_angle: 60.0,
            vision_confidence: 0.25,
            vision_concurrency: 4,
            alternatives: 5,
            hazard_proximity_m: 30.0,
            stop_sign_penalty_s: 15.0,
            routing_timeout: Duration::from_secs(15),
            traffic_timeout: Duration::from_secs(15),
            vision_timeout: Duration::from_secs(10),
        }
    }
}

impl RefinementConfig {
    pub fn hazard_settings(&self) -> HazardSettings {
        HazardSettings {
            sharp_turn_angle: self.sharp_turn_angle,
            vantage_distance_m: self.vantage_distance_m,
            hazard_radius_m: self.hazard_radius_m,
            confidence_threshold: self.vision_confidence,
            concurrency: self.vision_concurrency,
            timeout: self.vision_timeout,
        }
    }

    pub fn scoring_settings(&self) -> ScoringSettings {
        ScoringSettings {
            match_threshold_m: self.match_threshold_m,
            hazard_proximity_m: self.hazard_proximity_m,
            stop_sign_penalty_s: self.stop_sign_penalty_s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_line_up_with_component_defaults() {
        let config = RefinementConfig::default();
        assert_eq!(config.hazard_settings(), HazardSettings::default());
        assert_eq!(config.scoring_settings(), ScoringSettings::default());
    }
}
