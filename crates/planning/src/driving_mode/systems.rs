use bevy::prelude::*;

use crate::conflict::{resolve_right_of_way, ConflictMemory, RightOfWay, VehicleRegistry};
use crate::planner_params::PlannerParams;
use crate::vehicle::{PathInfo, VehicleDynamics, VehicleId, VehicleSensors};
use crate::waypoint_map::WaypointMap;
use crate::TickCounter;

use super::classifier::{classify, ClassifierInput};
use super::types::{DrivingDecision, DrivingMode, DrivingModeChanged, DrivingModeState};

/// Classify every vehicle and store the result in its [`DrivingDecision`].
///
/// Neighbour state is read only through the pre-tick [`VehicleRegistry`].
#[allow(clippy::type_complexity)]
pub fn classify_driving_modes(
    params: Res<PlannerParams>,
    map: Res<WaypointMap>,
    registry: Res<VehicleRegistry>,
    mut vehicles: Query<(
        &VehicleId,
        &VehicleDynamics,
        &VehicleSensors,
        &PathInfo,
        &mut DrivingDecision,
        &mut ConflictMemory,
    )>,
) {
    for (id, dynamics, sensors, path, mut decision, mut memory) in &mut vehicles {
        let input = ClassifierInput {
            dynamics,
            sensors,
            path,
        };
        let mut next = classify(&input, &*map, &params.classifier);

        if params.conflict.enabled && !path.destination_reached {
            if let RightOfWay::Yield { competitor } =
                resolve_right_of_way(&registry, *id, &mut memory)
            {
                if next.mode != DrivingMode::Stop {
                    debug!(
                        "vehicle {} yields to vehicle {} at waypoint conflict",
                        id.0, competitor.0
                    );
                }
                next.mode = DrivingMode::Stop;
            }
        }

        *decision = next;
    }
}

/// Write each vehicle's decided mode into its [`DrivingModeState`].
///
/// This is the only writer of `DrivingModeState`.
pub fn apply_driving_modes(
    tick: Res<TickCounter>,
    mut vehicles: Query<(Entity, &VehicleId, &DrivingDecision, &mut DrivingModeState)>,
    mut changed: EventWriter<DrivingModeChanged>,
) {
    for (entity, id, decision, mut state) in &mut vehicles {
        if state.0 == decision.mode {
            continue;
        }
        changed.send(DrivingModeChanged {
            entity,
            vehicle: *id,
            from: state.0,
            to: decision.mode,
            tick: tick.0,
        });
        state.0 = decision.mode;
    }
}
