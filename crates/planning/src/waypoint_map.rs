//! Waypoint positions and connectivity.
//!
//! The classifier only needs [`WaypointLookup::coordinates_of`]; the concrete
//! [`WaypointMap`] resource also routes vehicles between waypoints so that
//! scenarios can give an origin/destination instead of a full path.

use std::collections::HashMap;

use bevy::math::DVec2;
use bevy::prelude::*;

use crate::vehicle::WaypointId;

/// Map collaborator consumed by the classifier.
pub trait WaypointLookup {
    fn coordinates_of(&self, id: WaypointId) -> Option<DVec2>;
}

#[derive(Resource, Debug, Clone, Default)]
pub struct WaypointMap {
    positions: HashMap<WaypointId, DVec2>,
    links: HashMap<WaypointId, Vec<WaypointId>>,
}

impl WaypointLookup for WaypointMap {
    fn coordinates_of(&self, id: WaypointId) -> Option<DVec2> {
        self.positions.get(&id).copied()
    }
}

impl WaypointMap {
    /// Insert or move a waypoint.
    pub fn insert_waypoint(&mut self, id: WaypointId, position: DVec2) {
        self.positions.insert(id, position);
    }

    /// Add a directed link. Duplicate links are ignored.
    pub fn add_link(&mut self, from: WaypointId, to: WaypointId) {
        let out = self.links.entry(from).or_default();
        if !out.contains(&to) {
            out.push(to);
        }
    }

    pub fn waypoint_count(&self) -> usize {
        self.positions.len()
    }

    pub fn contains(&self, id: WaypointId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Successors of `id` with their link cost in whole millimetres.
    fn neighbor_costs(&self, id: WaypointId) -> Vec<(WaypointId, u64)> {
        let Some(from) = self.coordinates_of(id) else {
            return Vec::new();
        };
        self.links
            .get(&id)
            .map(|out| {
                out.iter()
                    .filter_map(|&next| {
                        let to = self.coordinates_of(next)?;
                        Some((next, ((to - from).length() * 1000.0).ceil() as u64))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Shortest waypoint sequence from `from` to `to` (both inclusive) using A*.
    pub fn route(&self, from: WaypointId, to: WaypointId) -> Option<Vec<WaypointId>> {
        let goal = self.coordinates_of(to)?;
        if !self.contains(from) {
            return None;
        }

        let result = pathfinding::prelude::astar(
            &from,
            |&id| self.neighbor_costs(id),
            |&id| {
                self.coordinates_of(id)
                    .map(|p| ((goal - p).length() * 1000.0).floor() as u64)
                    .unwrap_or(0)
            },
            |&id| id == to,
        );

        result.map(|(path, _cost)| path)
    }
}
