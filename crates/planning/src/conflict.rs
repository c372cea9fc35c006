//! Right-of-way resolution for vehicles converging on the same waypoint.
//!
//! Gated by `PlannerParams::conflict.enabled`. Once per tick, before any
//! vehicle is classified, [`snapshot_vehicle_registry`] copies every vehicle's
//! id, speed and last/next waypoint into the [`VehicleRegistry`] resource.
//! Classification then reads only that snapshot, so every vehicle sees the
//! same pre-tick state of its neighbours regardless of evaluation order.
//!
//! Priority rule: a vehicle yields to a competitor unless the competitor is
//! stationary and has a larger id. Moving vehicles therefore win, and among
//! stationary vehicles the lower id wins, so for any pair exactly one side
//! yields.

use std::fmt;

use bevy::prelude::*;

use crate::config::STATIONARY_SPEED_EPSILON;
use crate::planner_params::PlannerParams;
use crate::vehicle::{PathInfo, VehicleDynamics, VehicleId, WaypointId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictError {
    /// `last_waypoint` does not occur in the vehicle's path.
    WaypointNotOnPath(WaypointId),
    /// `last_waypoint` occurs more than once, i.e. the path loops.
    WaypointRevisited(WaypointId),
    /// More than one vehicle carries this id.
    DuplicateVehicleId(VehicleId),
}

impl fmt::Display for ConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictError::WaypointNotOnPath(id) => {
                write!(f, "last waypoint {} is not on the path", id.0)
            }
            ConflictError::WaypointRevisited(id) => {
                write!(f, "last waypoint {} appears more than once on the path", id.0)
            }
            ConflictError::DuplicateVehicleId(id) => {
                write!(f, "vehicle id {} is used by more than one vehicle", id.0)
            }
        }
    }
}

impl std::error::Error for ConflictError {}

// ---------------------------------------------------------------------------
// Active waypoints
// ---------------------------------------------------------------------------

/// Last passed and next upcoming waypoint of every vehicle, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveWaypoints {
    pub last: Vec<WaypointId>,
    pub next: Vec<WaypointId>,
}

/// The waypoint a vehicle is heading to.
///
/// A vehicle at its destination, or at the final waypoint of its path, claims
/// its last waypoint and so never conflicts with anyone.
pub fn next_waypoint(path: &PathInfo) -> Result<WaypointId, ConflictError> {
    let last = path.last_waypoint;
    let mut occurrences = path
        .path
        .iter()
        .enumerate()
        .filter(|(_, wp)| **wp == last)
        .map(|(i, _)| i);

    let index = occurrences
        .next()
        .ok_or(ConflictError::WaypointNotOnPath(last))?;
    if occurrences.next().is_some() {
        return Err(ConflictError::WaypointRevisited(last));
    }

    if path.destination_reached {
        return Ok(last);
    }
    Ok(path.path.get(index + 1).copied().unwrap_or(last))
}

/// Collect last/next waypoints for every vehicle in iteration order.
pub fn active_waypoints<'a>(
    paths: impl IntoIterator<Item = &'a PathInfo>,
) -> Result<ActiveWaypoints, ConflictError> {
    let mut active = ActiveWaypoints::default();
    for path in paths {
        active.next.push(next_waypoint(path)?);
        active.last.push(path.last_waypoint);
    }
    Ok(active)
}

/// First vehicle (lowest index) other than `index` heading to the same next
/// waypoint from a different last waypoint.
pub fn check_next_waypoint_clear(index: usize, waypoints: &ActiveWaypoints) -> Option<usize> {
    let next = *waypoints.next.get(index)?;
    let last = waypoints.last[index];
    (0..waypoints.next.len())
        .find(|&j| j != index && waypoints.next[j] == next && waypoints.last[j] != last)
}

// ---------------------------------------------------------------------------
// Registry snapshot
// ---------------------------------------------------------------------------

/// Pre-tick snapshot of all vehicles, sorted by id.
///
/// `waypoints` is `None` when resolution is disabled. Vehicles with a
/// malformed path or a shared id are left out and listed in `rejected`; they
/// never yield and nobody yields to them.
#[derive(Resource, Debug, Clone, Default)]
pub struct VehicleRegistry {
    pub ids: Vec<VehicleId>,
    pub speeds: Vec<f64>,
    pub waypoints: Option<ActiveWaypoints>,
    pub rejected: Vec<(VehicleId, ConflictError)>,
}

impl VehicleRegistry {
    pub fn build<'a>(vehicles: impl IntoIterator<Item = (VehicleId, f64, &'a PathInfo)>) -> Self {
        let mut entries: Vec<_> = vehicles.into_iter().collect();
        entries.sort_by_key(|(id, _, _)| *id);

        let mut registry = Self::default();
        let mut waypoints = ActiveWaypoints::default();
        for (i, &(id, speed, path)) in entries.iter().enumerate() {
            // ids are sorted, so duplicates are neighbours
            let shared = (i > 0 && entries[i - 1].0 == id)
                || entries.get(i + 1).is_some_and(|next| next.0 == id);
            if shared {
                if registry.rejected.last().map(|(r, _)| *r) != Some(id) {
                    registry
                        .rejected
                        .push((id, ConflictError::DuplicateVehicleId(id)));
                }
                continue;
            }

            match next_waypoint(path) {
                Ok(next) => {
                    registry.ids.push(id);
                    registry.speeds.push(speed);
                    waypoints.last.push(path.last_waypoint);
                    waypoints.next.push(next);
                }
                Err(e) => registry.rejected.push((id, e)),
            }
        }
        registry.waypoints = Some(waypoints);
        registry
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn index_of(&self, id: VehicleId) -> Option<usize> {
        self.ids.binary_search(&id).ok()
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Previous tick's next waypoint; used to detect a waypoint transition.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConflictMemory {
    pub previous_next: Option<WaypointId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RightOfWay {
    Proceed,
    Yield { competitor: VehicleId },
}

#[inline]
fn is_stationary(speed: f64) -> bool {
    speed.abs() < STATIONARY_SPEED_EPSILON
}

/// Decide whether `vehicle` must give way this tick.
///
/// The competitor scan only runs when the vehicle has just moved on to a new
/// next waypoint or is standing still, so a vehicle already committed to a
/// waypoint is not re-checked every tick.
pub fn resolve_right_of_way(
    registry: &VehicleRegistry,
    vehicle: VehicleId,
    memory: &mut ConflictMemory,
) -> RightOfWay {
    let (Some(waypoints), Some(index)) = (&registry.waypoints, registry.index_of(vehicle)) else {
        return RightOfWay::Proceed;
    };

    let next = waypoints.next[index];
    let transitioned = memory.previous_next != Some(next);
    memory.previous_next = Some(next);

    if !transitioned && !is_stationary(registry.speeds[index]) {
        return RightOfWay::Proceed;
    }

    match check_next_waypoint_clear(index, waypoints) {
        None => RightOfWay::Proceed,
        Some(j) => {
            let competitor = registry.ids[j];
            if is_stationary(registry.speeds[j]) && competitor > vehicle {
                RightOfWay::Proceed
            } else {
                RightOfWay::Yield { competitor }
            }
        }
    }
}

/// Rebuild the [`VehicleRegistry`] from the current (pre-decision) vehicle state.
pub fn snapshot_vehicle_registry(
    params: Res<PlannerParams>,
    mut registry: ResMut<VehicleRegistry>,
    vehicles: Query<(&VehicleId, &VehicleDynamics, &PathInfo)>,
) {
    if !params.conflict.enabled {
        if !registry.is_empty() || registry.waypoints.is_some() {
            *registry = VehicleRegistry::default();
        }
        return;
    }

    let snapshot = VehicleRegistry::build(
        vehicles
            .iter()
            .map(|(id, dynamics, path)| (*id, dynamics.speed, path)),
    );
    // only report a rejection on the tick it first appears
    for &(id, e) in &snapshot.rejected {
        if !registry.rejected.contains(&(id, e)) {
            warn!("vehicle {} left out of conflict resolution: {}", id.0, e);
        }
    }
    *registry = snapshot;
}
