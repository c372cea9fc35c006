//! Per-vehicle lane frame for the lateral controller.
//!
//! Vehicles with a [`CurrentSegment`] get their position projected onto that
//! segment every tick, together with the centre-line reference pose at the
//! same `s`.

use bevy::math::DVec2;
use bevy::prelude::*;

use crate::geometry::{
    cartesian_to_frenet, curvilinear_to_cartesian, FrenetCoordinate, GeometryError, Pose,
    RoadSegment,
};
use crate::vehicle::{CurrentSegment, VehicleDynamics, VehicleId};

/// All lane segments of the loaded map, indexed by [`CurrentSegment`].
#[derive(Resource, Debug, Clone, Default)]
pub struct RoadSegments {
    pub segments: Vec<RoadSegment>,
}

impl RoadSegments {
    pub fn get(&self, index: usize) -> Option<&RoadSegment> {
        self.segments.get(index)
    }

    pub fn push(&mut self, segment: RoadSegment) -> usize {
        self.segments.push(segment);
        self.segments.len() - 1
    }
}

#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct LaneFrame {
    pub frenet: FrenetCoordinate,
    /// Centre-line pose at `frenet.s`.
    pub reference: Pose,
}

/// Project `position` onto `segment` and look up the matching centre-line pose.
pub fn lane_frame_at(segment: &RoadSegment, position: DVec2) -> Result<LaneFrame, GeometryError> {
    let frenet = cartesian_to_frenet(segment, position)?;
    let reference = curvilinear_to_cartesian(segment, frenet.s, 0.0)?;
    Ok(LaneFrame { frenet, reference })
}

pub fn update_lane_frames(
    mut commands: Commands,
    segments: Res<RoadSegments>,
    mut vehicles: Query<(
        Entity,
        &VehicleId,
        &VehicleDynamics,
        &CurrentSegment,
        Option<&mut LaneFrame>,
    )>,
) {
    for (entity, id, dynamics, current, frame) in &mut vehicles {
        let Some(segment) = segments.get(current.0) else {
            warn!("vehicle {} references unknown segment {}", id.0, current.0);
            continue;
        };

        match lane_frame_at(segment, dynamics.position) {
            Ok(next) => match frame {
                Some(mut frame) => *frame = next,
                None => {
                    commands.entity(entity).insert(next);
                }
            },
            Err(e) => warn!("vehicle {} lane frame on segment {}: {}", id.0, current.0, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TurnDirection;

    #[test]
    fn test_lane_frame_on_straight() {
        let seg = RoadSegment::straight(DVec2::ZERO, DVec2::new(0.0, 50.0));
        let frame = lane_frame_at(&seg, DVec2::new(-1.5, 20.0)).unwrap();
        assert!((frame.frenet.s - 20.0).abs() < 1e-12);
        assert!((frame.frenet.d - 1.5).abs() < 1e-12);
        assert!((frame.reference.position - DVec2::new(0.0, 20.0)).length() < 1e-12);
        assert!((frame.reference.heading_degrees - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_lane_frame_on_arc_reference_on_centre_line() {
        let seg = RoadSegment::arc(
            DVec2::new(20.0, 0.0),
            DVec2::new(0.0, 20.0),
            DVec2::ZERO,
            TurnDirection::Clockwise,
        );
        let frame = lane_frame_at(&seg, DVec2::new(0.0, 22.0)).unwrap();
        assert!((frame.reference.position.length() - 20.0).abs() < 1e-9);
        assert!((frame.reference.position - DVec2::new(0.0, 20.0)).length() < 1e-9);
    }

    #[test]
    fn test_lane_frame_degenerate_segment() {
        let seg = RoadSegment::straight(DVec2::ONE, DVec2::ONE);
        assert_eq!(
            lane_frame_at(&seg, DVec2::ZERO),
            Err(GeometryError::DegenerateStraight)
        );
    }

    #[test]
    fn test_segments_push_returns_index() {
        let mut segments = RoadSegments::default();
        let a = segments.push(RoadSegment::straight(DVec2::ZERO, DVec2::X));
        let b = segments.push(RoadSegment::straight(DVec2::X, DVec2::Y));
        assert_eq!((a, b), (0, 1));
        assert!(segments.get(2).is_none());
    }
}
