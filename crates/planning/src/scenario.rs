//! JSON scenario files: map, lane segments, vehicles and parameter overrides.
//!
//! A scenario is loaded into a [`World`] by [`Scenario::spawn`], which inserts
//! the [`PlannerParams`], [`WaypointMap`] and [`RoadSegments`] resources and
//! spawns one entity per vehicle. Paths may be given explicitly or as a
//! `route: [from, to]` pair resolved with A* on the waypoint links.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use bevy::math::DVec2;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::conflict::{next_waypoint, ConflictError};
use crate::driving_mode::{DrivingDecision, DrivingMode, DrivingModeState};
use crate::geometry::{RoadSegment, TurnDirection};
use crate::lane_frame::{LaneFrame, RoadSegments};
use crate::planner_params::PlannerParams;
use crate::vehicle::{
    CurrentSegment, PathInfo, VehicleBundle, VehicleDynamics, VehicleId, VehicleSensors,
    WaypointId,
};
use crate::waypoint_map::WaypointMap;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ScenarioError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    UnknownWaypoint { vehicle: u32, waypoint: u32 },
    NoRoute { vehicle: u32, from: u32, to: u32 },
    MissingPath { vehicle: u32 },
    InvalidTurn { segment: usize, turn: i8 },
    UnknownSegment { vehicle: u32, segment: usize },
    DuplicateVehicleId { vehicle: u32 },
    InvalidPath { vehicle: u32, source: ConflictError },
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::Io(e) => write!(f, "failed to read scenario: {}", e),
            ScenarioError::Parse(e) => write!(f, "failed to parse scenario: {}", e),
            ScenarioError::UnknownWaypoint { vehicle, waypoint } => {
                write!(f, "vehicle {} references unknown waypoint {}", vehicle, waypoint)
            }
            ScenarioError::NoRoute { vehicle, from, to } => {
                write!(f, "vehicle {}: no route from {} to {}", vehicle, from, to)
            }
            ScenarioError::MissingPath { vehicle } => {
                write!(f, "vehicle {} has neither a path nor a route", vehicle)
            }
            ScenarioError::InvalidTurn { segment, turn } => {
                write!(f, "segment {} has turn {}, expected 1 or -1", segment, turn)
            }
            ScenarioError::UnknownSegment { vehicle, segment } => {
                write!(f, "vehicle {} references unknown segment {}", vehicle, segment)
            }
            ScenarioError::DuplicateVehicleId { vehicle } => {
                write!(f, "vehicle id {} is used more than once", vehicle)
            }
            ScenarioError::InvalidPath { vehicle, source } => {
                write!(f, "vehicle {} has an invalid path: {}", vehicle, source)
            }
        }
    }
}

impl std::error::Error for ScenarioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScenarioError::Io(e) => Some(e),
            ScenarioError::Parse(e) => Some(e),
            ScenarioError::InvalidPath { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ScenarioError {
    fn from(e: std::io::Error) -> Self {
        ScenarioError::Io(e)
    }
}

impl From<serde_json::Error> for ScenarioError {
    fn from(e: serde_json::Error) -> Self {
        ScenarioError::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointEntry {
    pub id: u32,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentEntry {
    Straight {
        start: [f64; 2],
        end: [f64; 2],
    },
    Arc {
        start: [f64; 2],
        end: [f64; 2],
        center: [f64; 2],
        /// `1` or `-1`.
        turn: i8,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleEntry {
    pub id: u32,
    #[serde(default)]
    pub speed: f64,
    pub max_speed: f64,
    #[serde(default)]
    pub position: [f64; 2],
    #[serde(default)]
    pub sensors: VehicleSensors,
    #[serde(default)]
    pub path: Option<Vec<u32>>,
    #[serde(default)]
    pub route: Option<[u32; 2]>,
    #[serde(default)]
    pub last_waypoint: Option<u32>,
    #[serde(default)]
    pub stop_at: Option<u32>,
    #[serde(default)]
    pub destination_reached: bool,
    #[serde(default)]
    pub segment: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub params: PlannerParams,
    pub waypoints: Vec<WaypointEntry>,
    pub links: Vec<[u32; 2]>,
    pub segments: Vec<SegmentEntry>,
    pub vehicles: Vec<VehicleEntry>,
}

fn vec2(p: [f64; 2]) -> DVec2 {
    DVec2::new(p[0], p[1])
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn build_map(&self) -> WaypointMap {
        let mut map = WaypointMap::default();
        for wp in &self.waypoints {
            map.insert_waypoint(WaypointId(wp.id), DVec2::new(wp.x, wp.y));
        }
        for &[from, to] in &self.links {
            map.add_link(WaypointId(from), WaypointId(to));
        }
        map
    }

    pub fn build_segments(&self) -> Result<RoadSegments, ScenarioError> {
        let mut segments = RoadSegments::default();
        for (index, entry) in self.segments.iter().enumerate() {
            let segment = match *entry {
                SegmentEntry::Straight { start, end } => {
                    RoadSegment::straight(vec2(start), vec2(end))
                }
                SegmentEntry::Arc {
                    start,
                    end,
                    center,
                    turn,
                } => {
                    let turn = match turn {
                        1 => TurnDirection::CounterClockwise,
                        -1 => TurnDirection::Clockwise,
                        other => {
                            return Err(ScenarioError::InvalidTurn {
                                segment: index,
                                turn: other,
                            })
                        }
                    };
                    RoadSegment::arc(vec2(start), vec2(end), vec2(center), turn)
                }
            };
            segments.push(segment);
        }
        Ok(segments)
    }

    fn resolve_path(entry: &VehicleEntry, map: &WaypointMap) -> Result<PathInfo, ScenarioError> {
        let check = |id: u32| {
            if map.contains(WaypointId(id)) {
                Ok(WaypointId(id))
            } else {
                Err(ScenarioError::UnknownWaypoint {
                    vehicle: entry.id,
                    waypoint: id,
                })
            }
        };

        let path = match (&entry.path, entry.route) {
            (Some(path), _) => path
                .iter()
                .map(|&id| check(id))
                .collect::<Result<Vec<_>, _>>()?,
            (None, Some([from, to])) => {
                check(from)?;
                check(to)?;
                map.route(WaypointId(from), WaypointId(to))
                    .ok_or(ScenarioError::NoRoute {
                        vehicle: entry.id,
                        from,
                        to,
                    })?
            }
            (None, None) => return Err(ScenarioError::MissingPath { vehicle: entry.id }),
        };

        let mut info = PathInfo::new(path);
        if let Some(last) = entry.last_waypoint {
            info.last_waypoint = check(last)?;
        }
        if let Some(stop) = entry.stop_at {
            info.stop_at = Some(check(stop)?);
        }
        info.destination_reached = entry.destination_reached;
        // the last waypoint must appear exactly once on the path
        next_waypoint(&info).map_err(|source| ScenarioError::InvalidPath {
            vehicle: entry.id,
            source,
        })?;
        Ok(info)
    }

    /// Insert the scenario's resources into `world` and spawn its vehicles.
    ///
    /// Everything is validated before the world is touched.
    pub fn spawn(&self, world: &mut World) -> Result<Vec<Entity>, ScenarioError> {
        let map = self.build_map();
        let segments = self.build_segments()?;

        let mut seen = HashSet::with_capacity(self.vehicles.len());
        let mut bundles = Vec::with_capacity(self.vehicles.len());
        for entry in &self.vehicles {
            if !seen.insert(entry.id) {
                return Err(ScenarioError::DuplicateVehicleId { vehicle: entry.id });
            }
            let path = Self::resolve_path(entry, &map)?;
            if let Some(segment) = entry.segment {
                if segments.get(segment).is_none() {
                    return Err(ScenarioError::UnknownSegment {
                        vehicle: entry.id,
                        segment,
                    });
                }
            }
            let dynamics = VehicleDynamics {
                speed: entry.speed,
                max_speed: entry.max_speed,
                position: vec2(entry.position),
            };
            bundles.push((
                VehicleBundle::new(VehicleId(entry.id), dynamics, entry.sensors, path),
                entry.segment,
            ));
        }

        info!(
            "scenario: {} waypoints, {} segments, {} vehicles",
            map.waypoint_count(),
            segments.segments.len(),
            bundles.len()
        );

        world.insert_resource(self.params.clone());
        world.insert_resource(map);
        world.insert_resource(segments);

        let entities = bundles
            .into_iter()
            .map(|(bundle, segment)| {
                let mut entity = world.spawn(bundle);
                if let Some(segment) = segment {
                    entity.insert(CurrentSegment(segment));
                }
                entity.id()
            })
            .collect();
        Ok(entities)
    }
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// One vehicle's state after a run, as printed by the app.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleReport {
    pub id: u32,
    pub mode: DrivingMode,
    pub mode_code: u8,
    pub decision: DrivingDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<f64>,
}

/// Collect reports for every vehicle, ordered by id.
pub fn collect_reports(world: &mut World) -> Vec<VehicleReport> {
    let mut query = world.query::<(
        &VehicleId,
        &DrivingModeState,
        &DrivingDecision,
        Option<&LaneFrame>,
    )>();
    let mut reports: Vec<VehicleReport> = query
        .iter(world)
        .map(|(id, state, decision, frame)| VehicleReport {
            id: id.0,
            mode: state.0,
            mode_code: state.0.code(),
            decision: *decision,
            s: frame.map(|f| f.frenet.s),
            d: frame.map(|f| f.frenet.d),
        })
        .collect();
    reports.sort_by_key(|r| r.id);
    reports
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"{
        "params": { "conflict": { "enabled": true } },
        "waypoints": [
            { "id": 1, "x": 0.0, "y": 0.0 },
            { "id": 2, "x": 100.0, "y": 0.0 },
            { "id": 3, "x": 200.0, "y": 0.0 }
        ],
        "links": [[1, 2], [2, 3]],
        "segments": [
            { "kind": "straight", "start": [0.0, 0.0], "end": [200.0, 0.0] },
            { "kind": "arc", "start": [10.0, 0.0], "end": [0.0, 10.0], "center": [0.0, 0.0], "turn": -1 }
        ],
        "vehicles": [
            { "id": 1, "speed": 10.0, "max_speed": 20.0, "route": [1, 3], "stop_at": 3, "segment": 0 },
            { "id": 2, "max_speed": 15.0, "path": [2, 3], "last_waypoint": 2 }
        ]
    }"#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        assert!(scenario.params.conflict.enabled);
        assert_eq!(scenario.waypoints.len(), 3);
        assert_eq!(scenario.vehicles.len(), 2);
        assert_eq!(scenario.vehicles[1].speed, 0.0);
    }

    #[test]
    fn test_build_segments() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        let segments = scenario.build_segments().unwrap();
        assert_eq!(segments.segments.len(), 2);
        assert_eq!(segments.get(1).and_then(|s| s.radius()), Some(10.0));
    }

    #[test]
    fn test_invalid_turn_rejected() {
        let mut scenario = Scenario::from_json(SCENARIO).unwrap();
        scenario.segments.push(SegmentEntry::Arc {
            start: [1.0, 0.0],
            end: [0.0, 1.0],
            center: [0.0, 0.0],
            turn: 0,
        });
        assert!(matches!(
            scenario.build_segments(),
            Err(ScenarioError::InvalidTurn { segment: 2, turn: 0 })
        ));
    }

    #[test]
    fn test_spawn_routes_and_inserts_resources() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        let mut world = World::new();
        let entities = scenario.spawn(&mut world).unwrap();
        assert_eq!(entities.len(), 2);

        let path = world.get::<PathInfo>(entities[0]).unwrap();
        assert_eq!(path.path, vec![WaypointId(1), WaypointId(2), WaypointId(3)]);
        assert_eq!(path.stop_at, Some(WaypointId(3)));
        assert!(world.get::<CurrentSegment>(entities[0]).is_some());
        assert!(world.get::<CurrentSegment>(entities[1]).is_none());

        assert!(world.resource::<PlannerParams>().conflict.enabled);
        assert_eq!(world.resource::<WaypointMap>().waypoint_count(), 3);
    }

    #[test]
    fn test_unknown_waypoint_rejected_before_spawning() {
        let mut scenario = Scenario::from_json(SCENARIO).unwrap();
        scenario.vehicles[1].stop_at = Some(42);
        let mut world = World::new();
        let err = scenario.spawn(&mut world).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::UnknownWaypoint {
                vehicle: 2,
                waypoint: 42
            }
        ));
        assert_eq!(world.query::<&VehicleId>().iter(&world).count(), 0);
        assert!(world.get_resource::<WaypointMap>().is_none());
    }

    #[test]
    fn test_missing_path_and_route() {
        let mut scenario = Scenario::from_json(SCENARIO).unwrap();
        scenario.vehicles[0].route = None;
        let err = scenario.spawn(&mut World::new()).unwrap_err();
        assert!(matches!(err, ScenarioError::MissingPath { vehicle: 1 }));
    }

    #[test]
    fn test_no_route() {
        let mut scenario = Scenario::from_json(SCENARIO).unwrap();
        scenario.vehicles[0].route = Some([3, 1]);
        let err = scenario.spawn(&mut World::new()).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::NoRoute {
                vehicle: 1,
                from: 3,
                to: 1
            }
        ));
    }

    #[test]
    fn test_duplicate_vehicle_id_rejected_before_spawning() {
        let mut scenario = Scenario::from_json(SCENARIO).unwrap();
        scenario.vehicles[1].id = 1;
        let mut world = World::new();
        let err = scenario.spawn(&mut world).unwrap_err();
        assert!(matches!(err, ScenarioError::DuplicateVehicleId { vehicle: 1 }));
        assert_eq!(world.query::<&VehicleId>().iter(&world).count(), 0);
    }

    #[test]
    fn test_last_waypoint_off_path_rejected() {
        let mut scenario = Scenario::from_json(SCENARIO).unwrap();
        scenario.vehicles[1].last_waypoint = Some(1);
        let err = scenario.spawn(&mut World::new()).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::InvalidPath {
                vehicle: 2,
                source: ConflictError::WaypointNotOnPath(WaypointId(1))
            }
        ));
        assert!(err.to_string().contains("vehicle 2 has an invalid path"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_looping_path_rejected() {
        let mut scenario = Scenario::from_json(SCENARIO).unwrap();
        scenario.vehicles[1].path = Some(vec![2, 3, 2]);
        let err = scenario.spawn(&mut World::new()).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::InvalidPath {
                vehicle: 2,
                source: ConflictError::WaypointRevisited(WaypointId(2))
            }
        ));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = Scenario::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ScenarioError::Parse(_)));
        assert!(err.to_string().starts_with("failed to parse scenario"));
    }
}
