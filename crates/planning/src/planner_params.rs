//! Runtime-tunable planner parameters.
//!
//! Collects the classifier thresholds and the conflict-resolution gate into a
//! single [`PlannerParams`] resource. Defaults come from [`crate::config`];
//! scenario files may override any subset of fields since every struct is
//! `#[serde(default)]`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{DETECTION_MARGIN, DISTANCE_REFERENCE_CAP, HEADWAY_SECONDS};

// ---------------------------------------------------------------------------
// Classifier parameters
// ---------------------------------------------------------------------------

/// Thresholds used by the driving-mode classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierParams {
    /// Seconds of headway: the ignore distance grows by `speed * headway_seconds`.
    pub headway_seconds: f64,
    /// Constant margin added to the ignore distance, on top of the safe distance.
    pub detection_margin: f64,
    /// Upper clamp for the distance reference output.
    pub distance_reference_cap: f64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            headway_seconds: HEADWAY_SECONDS,
            detection_margin: DETECTION_MARGIN,
            distance_reference_cap: DISTANCE_REFERENCE_CAP,
        }
    }
}

impl ClassifierParams {
    /// Lead distance beyond which a detected vehicle is ignored.
    pub fn ignore_distance(&self, speed: f64, safe_distance: f64) -> f64 {
        speed * self.headway_seconds + safe_distance + self.detection_margin
    }
}

// ---------------------------------------------------------------------------
// Conflict resolution parameters
// ---------------------------------------------------------------------------

/// Gate for the intersection conflict resolver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictParams {
    /// Disabled unless a scenario opts in.
    pub enabled: bool,
}

// ---------------------------------------------------------------------------
// PlannerParams resource
// ---------------------------------------------------------------------------

/// Top-level resource holding every planner tunable.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerParams {
    pub classifier: ClassifierParams,
    pub conflict: ConflictParams,
}

impl PlannerParams {
    /// Defaults with the conflict resolver switched on.
    pub fn with_conflict_resolution() -> Self {
        Self {
            conflict: ConflictParams { enabled: true },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_config() {
        let params = PlannerParams::default();
        assert_eq!(params.classifier.headway_seconds, 1.4);
        assert_eq!(params.classifier.detection_margin, 25.0);
        assert_eq!(params.classifier.distance_reference_cap, 1000.0);
        assert!(!params.conflict.enabled);
    }

    #[test]
    fn test_ignore_distance_scales_with_speed() {
        let params = ClassifierParams::default();
        assert!((params.ignore_distance(20.0, 10.0) - 63.0).abs() < 1e-9);
        assert!((params.ignore_distance(0.0, 10.0) - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let json = r#"{ "conflict": { "enabled": true } }"#;
        let params: PlannerParams = serde_json::from_str(json).unwrap();
        assert!(params.conflict.enabled);
        assert_eq!(params.classifier, ClassifierParams::default());
    }

    #[test]
    fn test_json_overrides_threshold() {
        let json = r#"{ "classifier": { "headway_seconds": 2.0 } }"#;
        let params: PlannerParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.classifier.headway_seconds, 2.0);
        assert_eq!(params.classifier.detection_margin, DETECTION_MARGIN);
    }
}
