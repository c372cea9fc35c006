//! Per-tick driving-mode decision.
//!
//! Every call recomputes the decision from the snapshot alone, so a glitching
//! sensor value only affects the tick it was read on.

use bevy::prelude::*;

use crate::planner_params::ClassifierParams;
use crate::vehicle::{PathInfo, VehicleDynamics, VehicleSensors};
use crate::waypoint_map::WaypointLookup;

use super::types::{DrivingDecision, DrivingMode};

/// Borrowed view of one vehicle's snapshot for the current tick.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierInput<'a> {
    pub dynamics: &'a VehicleDynamics,
    pub sensors: &'a VehicleSensors,
    pub path: &'a PathInfo,
}

/// Compute the decision for one vehicle.
///
/// The result is not applied to the vehicle here; see
/// [`apply_driving_modes`](super::apply_driving_modes).
pub fn classify(
    input: &ClassifierInput<'_>,
    map: &impl WaypointLookup,
    params: &ClassifierParams,
) -> DrivingDecision {
    if input.path.destination_reached {
        return DrivingDecision::inactive();
    }

    let dynamics = input.dynamics;
    let sensors = input.sensors;

    let mut mode = if sensors.vehicle_detected {
        select_lead_mode(dynamics.speed, sensors, params)
    } else {
        DrivingMode::Cruise
    };

    let mut dist_to_stop = 0.0;
    if let Some(stop_at) = input.path.stop_at {
        match map.coordinates_of(stop_at) {
            Some(stop_pos) => {
                dist_to_stop = (dynamics.position - stop_pos).length();
                if mode != DrivingMode::Stop {
                    mode = DrivingMode::ApproachIntersection;
                }
            }
            None => {
                warn!(
                    "stop waypoint {} is not on the map, ignoring stop point",
                    stop_at.0
                );
            }
        }
    }

    // clamped above only; negative ("no lead") and NaN readings pass through
    let distance = sensors.distance_to_leading_vehicle;
    let distance_reference = if distance > params.distance_reference_cap {
        params.distance_reference_cap
    } else {
        distance
    };

    DrivingDecision {
        speed_reference: dynamics.max_speed,
        distance_reference,
        lead_speed: sensors.leading_vehicle_speed,
        mode,
        dist_to_stop,
        lane_change: 0,
    }
}

/// Mode implied by a detected leading vehicle, before any stop point.
///
/// Comparisons are strict so a lead sitting exactly on a threshold falls to
/// the more cautious branch.
pub fn select_lead_mode(
    speed: f64,
    sensors: &VehicleSensors,
    params: &ClassifierParams,
) -> DrivingMode {
    let distance = sensors.distance_to_leading_vehicle;

    if distance > sensors.front_sensor_range
        || distance < 0.0
        || distance > params.ignore_distance(speed, sensors.safe_distance)
    {
        DrivingMode::Cruise
    } else if distance > sensors.aeb_distance {
        DrivingMode::Platoon
    } else if sensors.leading_vehicle_speed - speed > 0.0 {
        // close, but the gap is opening
        DrivingMode::Platoon
    } else {
        DrivingMode::Stop
    }
}
