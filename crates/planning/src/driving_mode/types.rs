use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::INACTIVE_SENTINEL;
use crate::vehicle::VehicleId;

/// Longitudinal driving mode. Discriminants are the codes exchanged with the
/// downstream controllers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DrivingMode {
    #[default]
    Cruise = 1,
    Platoon = 2,
    Stop = 3,
    ApproachIntersection = 4,
}

impl DrivingMode {
    pub const ALL: [DrivingMode; 4] = [
        DrivingMode::Cruise,
        DrivingMode::Platoon,
        DrivingMode::Stop,
        DrivingMode::ApproachIntersection,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            DrivingMode::Cruise => "Cruise",
            DrivingMode::Platoon => "Platoon",
            DrivingMode::Stop => "Stop",
            DrivingMode::ApproachIntersection => "ApproachIntersection",
        }
    }
}

impl fmt::Display for DrivingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A mode code outside `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidDrivingMode(pub u8);

impl fmt::Display for InvalidDrivingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid driving mode code {}", self.0)
    }
}

impl std::error::Error for InvalidDrivingMode {}

impl TryFrom<u8> for DrivingMode {
    type Error = InvalidDrivingMode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(DrivingMode::Cruise),
            2 => Ok(DrivingMode::Platoon),
            3 => Ok(DrivingMode::Stop),
            4 => Ok(DrivingMode::ApproachIntersection),
            other => Err(InvalidDrivingMode(other)),
        }
    }
}

/// Per-tick classifier output forwarded to the longitudinal/lateral controllers.
///
/// Negative distance or speed values are "not applicable" sentinels, not
/// measurements.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrivingDecision {
    pub speed_reference: f64,
    pub distance_reference: f64,
    pub lead_speed: f64,
    pub mode: DrivingMode,
    pub dist_to_stop: f64,
    /// Reserved for lateral planning; always 0.
    pub lane_change: i32,
}

impl DrivingDecision {
    /// Output of a vehicle that has reached its destination.
    pub const fn inactive() -> Self {
        Self {
            speed_reference: 0.0,
            distance_reference: INACTIVE_SENTINEL,
            lead_speed: INACTIVE_SENTINEL,
            mode: DrivingMode::Cruise,
            dist_to_stop: INACTIVE_SENTINEL,
            lane_change: 0,
        }
    }
}

impl Default for DrivingDecision {
    fn default() -> Self {
        Self::inactive()
    }
}

/// The mode currently applied to a vehicle. Only the apply step writes it.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrivingModeState(pub DrivingMode);

/// Fired by the apply step when a vehicle's applied mode changes.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DrivingModeChanged {
    pub entity: Entity,
    pub vehicle: VehicleId,
    pub from: DrivingMode,
    pub to: DrivingMode,
    pub tick: u64,
}
