//! Per-vehicle ECS components.
//!
//! Dynamics, sensors and path info are snapshots written by external
//! collaborators (dynamics model, sensor model, router) and only read by the
//! planner. The planner's own outputs live in
//! [`DrivingDecision`](crate::driving_mode::DrivingDecision) and
//! [`DrivingModeState`](crate::driving_mode::DrivingModeState).

use bevy::math::DVec2;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::conflict::ConflictMemory;
use crate::driving_mode::{DrivingDecision, DrivingModeState};

/// Stable vehicle identity. Also the right-of-way tie-break key.
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct VehicleId(pub u32);

/// Waypoint identifier on the road network.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct WaypointId(pub u32);

/// Longitudinal state as reported by the dynamics model.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct VehicleDynamics {
    pub speed: f64,
    pub max_speed: f64,
    pub position: DVec2,
}

/// Front sensor readings about the leading vehicle.
///
/// `distance_to_leading_vehicle` may be negative to signal "no lead"; it is
/// only trusted when `vehicle_detected` is set.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleSensors {
    pub vehicle_detected: bool,
    pub distance_to_leading_vehicle: f64,
    pub leading_vehicle_speed: f64,
    pub front_sensor_range: f64,
    pub safe_distance: f64,
    pub aeb_distance: f64,
}

impl Default for VehicleSensors {
    fn default() -> Self {
        Self {
            vehicle_detected: false,
            distance_to_leading_vehicle: -1.0,
            leading_vehicle_speed: -1.0,
            front_sensor_range: 100.0,
            safe_distance: 10.0,
            aeb_distance: 5.0,
        }
    }
}

/// Planned route and progress along it.
///
/// Waypoints are never revisited, so `last_waypoint` appears exactly once in
/// `path` for a well-formed route.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct PathInfo {
    pub path: Vec<WaypointId>,
    pub last_waypoint: WaypointId,
    pub stop_at: Option<WaypointId>,
    pub destination_reached: bool,
}

impl PathInfo {
    /// Route starting at its first waypoint, nothing passed beyond it yet.
    pub fn new(path: Vec<WaypointId>) -> Self {
        let last_waypoint = path.first().copied().unwrap_or(WaypointId(0));
        Self {
            path,
            last_waypoint,
            stop_at: None,
            destination_reached: false,
        }
    }

    pub fn with_stop_at(mut self, stop_at: WaypointId) -> Self {
        self.stop_at = Some(stop_at);
        self
    }
}

/// Index into [`RoadSegments`](crate::lane_frame::RoadSegments) of the lane the
/// vehicle is currently driving on.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentSegment(pub usize);

/// Everything the planner needs on a vehicle entity.
#[derive(Bundle)]
pub struct VehicleBundle {
    pub id: VehicleId,
    pub dynamics: VehicleDynamics,
    pub sensors: VehicleSensors,
    pub path: PathInfo,
    pub decision: DrivingDecision,
    pub mode: DrivingModeState,
    pub memory: ConflictMemory,
}

impl VehicleBundle {
    pub fn new(
        id: VehicleId,
        dynamics: VehicleDynamics,
        sensors: VehicleSensors,
        path: PathInfo,
    ) -> Self {
        Self {
            id,
            dynamics,
            sensors,
            path,
            decision: DrivingDecision::default(),
            mode: DrivingModeState::default(),
            memory: ConflictMemory::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_info_starts_at_first_waypoint() {
        let info = PathInfo::new(vec![WaypointId(4), WaypointId(7)]);
        assert_eq!(info.last_waypoint, WaypointId(4));
        assert_eq!(info.stop_at, None);
        assert!(!info.destination_reached);
    }

    #[test]
    fn test_sensor_defaults_report_no_lead() {
        let sensors = VehicleSensors::default();
        assert!(!sensors.vehicle_detected);
        assert!(sensors.distance_to_leading_vehicle < 0.0);
    }

    #[test]
    fn test_sensors_partial_json() {
        let json = r#"{ "vehicle_detected": true, "distance_to_leading_vehicle": 42.0 }"#;
        let sensors: VehicleSensors = serde_json::from_str(json).unwrap();
        assert!(sensors.vehicle_detected);
        assert_eq!(sensors.distance_to_leading_vehicle, 42.0);
        assert_eq!(sensors.aeb_distance, 5.0);
    }

    #[test]
    fn test_vehicle_ids_order_by_value() {
        let mut ids = vec![VehicleId(3), VehicleId(1), VehicleId(2)];
        ids.sort();
        assert_eq!(ids, vec![VehicleId(1), VehicleId(2), VehicleId(3)]);
    }
}
