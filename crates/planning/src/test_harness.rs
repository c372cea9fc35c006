//! # TestScenario: headless harness for planner integration tests
//!
//! Wraps `bevy::app::App` + [`PlanningPlugin`] without a window or renderer.
//! Build the road network and vehicles with the builder methods, call
//! [`TestScenario::tick`] to run planning ticks, then query the ECS state.

use bevy::app::App;
use bevy::math::DVec2;
use bevy::prelude::*;

use crate::driving_mode::{DrivingDecision, DrivingMode, DrivingModeState};
use crate::geometry::RoadSegment;
use crate::lane_frame::{LaneFrame, RoadSegments};
use crate::mode_stats::DrivingModeStats;
use crate::planner_params::PlannerParams;
use crate::scenario::{Scenario, ScenarioError};
use crate::vehicle::{
    CurrentSegment, PathInfo, VehicleBundle, VehicleDynamics, VehicleId, VehicleSensors,
    WaypointId,
};
use crate::waypoint_map::WaypointMap;
use crate::{PlanningPlugin, TickCounter};

pub struct TestScenario {
    app: App,
}

impl Default for TestScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl TestScenario {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Empty map, no vehicles, default parameters.
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(PlanningPlugin);
        app.update();
        Self { app }
    }

    pub fn from_scenario(scenario: &Scenario) -> Result<Self, ScenarioError> {
        let mut harness = Self::new();
        scenario.spawn(harness.app.world_mut())?;
        Ok(harness)
    }

    // -----------------------------------------------------------------------
    // Setup
    // -----------------------------------------------------------------------

    pub fn with_params(mut self, params: PlannerParams) -> Self {
        self.app.world_mut().insert_resource(params);
        self
    }

    pub fn with_conflict_resolution(self) -> Self {
        self.with_params(PlannerParams::with_conflict_resolution())
    }

    pub fn with_waypoint(mut self, id: u32, x: f64, y: f64) -> Self {
        self.app
            .world_mut()
            .resource_mut::<WaypointMap>()
            .insert_waypoint(WaypointId(id), DVec2::new(x, y));
        self
    }

    pub fn with_segment(mut self, segment: RoadSegment) -> Self {
        self.app
            .world_mut()
            .resource_mut::<RoadSegments>()
            .push(segment);
        self
    }

    // -----------------------------------------------------------------------
    // Spawning
    // -----------------------------------------------------------------------

    pub fn spawn_vehicle(
        &mut self,
        id: u32,
        dynamics: VehicleDynamics,
        sensors: VehicleSensors,
        path: PathInfo,
    ) -> Entity {
        self.app
            .world_mut()
            .spawn(VehicleBundle::new(VehicleId(id), dynamics, sensors, path))
            .id()
    }

    /// Vehicle with no lead in sight travelling along `path`.
    pub fn spawn_cruiser(&mut self, id: u32, speed: f64, path: &[u32]) -> Entity {
        let dynamics = VehicleDynamics {
            speed,
            max_speed: 20.0,
            position: DVec2::ZERO,
        };
        let path = PathInfo::new(path.iter().map(|&w| WaypointId(w)).collect());
        self.spawn_vehicle(id, dynamics, VehicleSensors::default(), path)
    }

    pub fn place_on_segment(&mut self, entity: Entity, segment: usize) {
        self.app
            .world_mut()
            .entity_mut(entity)
            .insert(CurrentSegment(segment));
    }

    // -----------------------------------------------------------------------
    // Mutation (stands in for the external dynamics / sensor / router models)
    // -----------------------------------------------------------------------

    pub fn set_speed(&mut self, entity: Entity, speed: f64) {
        if let Some(mut dynamics) = self.app.world_mut().get_mut::<VehicleDynamics>(entity) {
            dynamics.speed = speed;
        }
    }

    pub fn set_position(&mut self, entity: Entity, position: DVec2) {
        if let Some(mut dynamics) = self.app.world_mut().get_mut::<VehicleDynamics>(entity) {
            dynamics.position = position;
        }
    }

    pub fn set_sensors(&mut self, entity: Entity, sensors: VehicleSensors) {
        if let Some(mut current) = self.app.world_mut().get_mut::<VehicleSensors>(entity) {
            *current = sensors;
        }
    }

    pub fn set_last_waypoint(&mut self, entity: Entity, waypoint: u32) {
        if let Some(mut path) = self.app.world_mut().get_mut::<PathInfo>(entity) {
            path.last_waypoint = WaypointId(waypoint);
        }
    }

    pub fn set_destination_reached(&mut self, entity: Entity) {
        if let Some(mut path) = self.app.world_mut().get_mut::<PathInfo>(entity) {
            path.destination_reached = true;
        }
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Run `n` planning ticks. Runs the `FixedUpdate` schedule directly so
    /// tick counts do not depend on wall-clock time.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn resource<T: Resource>(&self) -> &T {
        self.app.world().resource::<T>()
    }

    pub fn current_tick(&self) -> u64 {
        self.resource::<TickCounter>().0
    }

    pub fn decision(&self, entity: Entity) -> DrivingDecision {
        self.app
            .world()
            .get::<DrivingDecision>(entity)
            .copied()
            .unwrap_or_default()
    }

    pub fn mode(&self, entity: Entity) -> DrivingMode {
        self.app
            .world()
            .get::<DrivingModeState>(entity)
            .map(|state| state.0)
            .unwrap_or_default()
    }

    pub fn lane_frame(&self, entity: Entity) -> Option<LaneFrame> {
        self.app.world().get::<LaneFrame>(entity).copied()
    }

    pub fn stats(&self) -> &DrivingModeStats {
        self.resource::<DrivingModeStats>()
    }

    pub fn vehicle_count(&mut self) -> usize {
        let world = self.app.world_mut();
        world.query::<&VehicleId>().iter(world).count()
    }

    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    pub fn assert_mode(&self, entity: Entity, expected: DrivingMode) {
        let actual = self.mode(entity);
        assert_eq!(
            actual, expected,
            "Expected {:?} in {}, got {}",
            entity, expected, actual
        );
    }

    pub fn assert_resource_exists<T: Resource>(&self) {
        assert!(
            self.app.world().get_resource::<T>().is_some(),
            "Expected resource {} to exist",
            std::any::type_name::<T>()
        );
    }
}
