use bevy::prelude::*;

pub mod config;
pub mod conflict;
pub mod driving_mode;
pub mod geometry;
pub mod lane_frame;
pub mod mode_stats;
pub mod planner_params;
pub mod planning_sets;
pub mod scenario;
pub mod vehicle;
pub mod waypoint_map;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use planning_sets::PlanningSet;

use conflict::{snapshot_vehicle_registry, VehicleRegistry};
use driving_mode::{apply_driving_modes, classify_driving_modes, DrivingModeChanged};
use lane_frame::{update_lane_frames, RoadSegments};
use mode_stats::{update_mode_stats, DrivingModeStats};
use planner_params::PlannerParams;
use waypoint_map::WaypointMap;

// ---------------------------------------------------------------------------
// Core resources
// ---------------------------------------------------------------------------

/// Planning tick counter incremented at the start of each FixedUpdate.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

fn tick_counter(mut tick: ResMut<TickCounter>) {
    tick.0 += 1;
}

pub struct PlanningPlugin;

impl Plugin for PlanningPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TickCounter>()
            .init_resource::<PlannerParams>()
            .init_resource::<WaypointMap>()
            .init_resource::<RoadSegments>()
            .init_resource::<VehicleRegistry>()
            .init_resource::<DrivingModeStats>()
            .add_event::<DrivingModeChanged>();

        app.configure_sets(
            FixedUpdate,
            (
                PlanningSet::Snapshot,
                PlanningSet::Decide,
                PlanningSet::Apply,
                PlanningSet::Report,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            (tick_counter, snapshot_vehicle_registry)
                .chain()
                .in_set(PlanningSet::Snapshot),
        )
        .add_systems(
            FixedUpdate,
            (classify_driving_modes, update_lane_frames).in_set(PlanningSet::Decide),
        )
        .add_systems(FixedUpdate, apply_driving_modes.in_set(PlanningSet::Apply))
        .add_systems(FixedUpdate, update_mode_stats.in_set(PlanningSet::Report));
    }
}
