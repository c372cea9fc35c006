//! Lane-relative (Frenet) <-> world (Cartesian) conversions for road segments.
//!
//! A segment is either a straight line from `start` to `end` or a circular arc
//! around `center`. Along a segment, `s` is the distance travelled from `start`
//! and `d` the signed lateral offset.
//!
//! Two asymmetries hold:
//! - on straight segments [`curvilinear_to_cartesian`] places the point on the
//!   centre line and ignores `d`;
//! - on arcs [`cartesian_to_frenet`] recovers only the magnitude of `s`, so a
//!   round trip through both functions is exact only for `s` in `[0, pi * r]`.

use std::f64::consts::TAU;
use std::fmt;

use bevy::math::DVec2;

use crate::config::GEOMETRY_EPSILON;

/// Sign convention of an arc segment.
///
/// The sign enters the frame formulas as `theta(s) = theta0 - sign * s / r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnDirection {
    /// Sign `+1`.
    CounterClockwise,
    /// Sign `-1`.
    Clockwise,
}

impl TurnDirection {
    pub fn sign(self) -> f64 {
        match self {
            TurnDirection::CounterClockwise => 1.0,
            TurnDirection::Clockwise => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentKind {
    Straight,
    Arc { center: DVec2, turn: TurnDirection },
}

/// One lane piece. Owned by the map, borrowed per conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadSegment {
    pub start: DVec2,
    pub end: DVec2,
    pub kind: SegmentKind,
}

/// Position along a segment (`s`) and signed lateral offset (`d`, left positive).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrenetCoordinate {
    pub s: f64,
    pub d: f64,
}

/// World position plus heading in degrees within `(-180, 180]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    pub position: DVec2,
    pub heading_degrees: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    /// Straight segment whose start and end coincide.
    DegenerateStraight,
    /// Arc whose start point sits on its rotation center.
    DegenerateArc,
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::DegenerateStraight => {
                write!(f, "degenerate segment: straight segment has zero length")
            }
            GeometryError::DegenerateArc => {
                write!(f, "degenerate segment: arc has zero radius")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

impl RoadSegment {
    pub fn straight(start: DVec2, end: DVec2) -> Self {
        Self {
            start,
            end,
            kind: SegmentKind::Straight,
        }
    }

    pub fn arc(start: DVec2, end: DVec2, center: DVec2, turn: TurnDirection) -> Self {
        Self {
            start,
            end,
            kind: SegmentKind::Arc { center, turn },
        }
    }

    /// Radius of an arc segment, `None` for straight ones.
    pub fn radius(&self) -> Option<f64> {
        match self.kind {
            SegmentKind::Straight => None,
            SegmentKind::Arc { center, .. } => Some((self.start - center).length()),
        }
    }

    /// Length of the segment along its direction of travel.
    ///
    /// For arcs this is the radius times the angle swept from `start` to `end`
    /// in the direction `theta(s)` moves. Coinciding start/end angles yield 0.
    pub fn length(&self) -> Result<f64, GeometryError> {
        match self.kind {
            SegmentKind::Straight => straight_axis(self).map(|(_, len)| len),
            SegmentKind::Arc { center, turn } => {
                let r = arc_radius(self, center)?;
                let a0 = angle_of(self.start - center);
                let a1 = angle_of(self.end - center);
                let swept = ((a1 - a0) * -turn.sign()).rem_euclid(TAU);
                Ok(r * swept)
            }
        }
    }
}

/// Reduce a heading into `(-180, 180]`.
pub fn normalize_heading_degrees(heading: f64) -> f64 {
    let reduced = heading.rem_euclid(360.0);
    if reduced > 180.0 {
        reduced - 360.0
    } else {
        reduced
    }
}

/// Convert `(s, d)` on `segment` into a world pose.
pub fn curvilinear_to_cartesian(
    segment: &RoadSegment,
    s: f64,
    d: f64,
) -> Result<Pose, GeometryError> {
    match segment.kind {
        SegmentKind::Straight => {
            let (unit, _) = straight_axis(segment)?;
            Ok(Pose {
                position: segment.start + s * unit,
                heading_degrees: angle_of(unit).to_degrees(),
            })
        }
        SegmentKind::Arc { center, turn } => {
            let r = arc_radius(segment, center)?;
            let sign = turn.sign();
            let theta0 = angle_of(segment.start - center);
            // lateral offset shifts the point onto a concentric circle
            let lane_radius = r - d * sign;
            let theta = -sign * s / r + theta0;
            Ok(Pose {
                position: center + lane_radius * DVec2::new(theta.cos(), theta.sin()),
                heading_degrees: normalize_heading_degrees(theta.to_degrees() - sign * 90.0),
            })
        }
    }
}

/// Project a world position onto `segment`'s Frenet frame.
///
/// On arcs `s` is unsigned; a position exactly at the rotation center maps to
/// `s = 0`.
pub fn cartesian_to_frenet(
    segment: &RoadSegment,
    pos: DVec2,
) -> Result<FrenetCoordinate, GeometryError> {
    match segment.kind {
        SegmentKind::Straight => {
            let (unit, _) = straight_axis(segment)?;
            let rel = pos - segment.start;
            Ok(FrenetCoordinate {
                s: rel.dot(unit),
                d: rel.dot(unit.perp()),
            })
        }
        SegmentKind::Arc { center, turn } => {
            let r = arc_radius(segment, center)?;
            let rel = pos - center;
            let dist = rel.length();
            let d = (dist - r) * turn.sign();
            if dist <= GEOMETRY_EPSILON {
                return Ok(FrenetCoordinate { s: 0.0, d });
            }
            let start_dir = (segment.start - center) / r;
            let cos_angle = (rel / dist).dot(start_dir).clamp(-1.0, 1.0);
            Ok(FrenetCoordinate {
                s: r * cos_angle.acos(),
                d,
            })
        }
    }
}

fn straight_axis(segment: &RoadSegment) -> Result<(DVec2, f64), GeometryError> {
    let v = segment.end - segment.start;
    let len = v.length();
    if len <= GEOMETRY_EPSILON {
        return Err(GeometryError::DegenerateStraight);
    }
    Ok((v / len, len))
}

fn arc_radius(segment: &RoadSegment, center: DVec2) -> Result<f64, GeometryError> {
    let r = (segment.start - center).length();
    if r <= GEOMETRY_EPSILON {
        return Err(GeometryError::DegenerateArc);
    }
    Ok(r)
}

#[inline]
fn angle_of(v: DVec2) -> f64 {
    v.y.atan2(v.x)
}
