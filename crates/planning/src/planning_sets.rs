//! Deterministic per-tick ordering via `SystemSet` phases.
//!
//! ```text
//! Snapshot  →  Decide  →  Apply  →  Report
//! ```
//!
//! * **Snapshot** – tick counter and the [`VehicleRegistry`] copy of every
//!   vehicle's pre-tick state. Nothing later in the tick may feed back into
//!   this copy.
//! * **Decide** – driving-mode classification (reading neighbours only via
//!   the registry) and lane-frame projection. Each system writes only
//!   per-vehicle components of the vehicle it is evaluating.
//! * **Apply** – copies decisions into `DrivingModeState`; the only writer of
//!   that component.
//! * **Report** – read-only aggregation (`DrivingModeStats`).
//!
//! [`VehicleRegistry`]: crate::conflict::VehicleRegistry

use bevy::prelude::*;

/// Ordered phases for systems running in the `FixedUpdate` schedule.
///
/// Configured as a chain in [`PlanningPlugin`](crate::PlanningPlugin).
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlanningSet {
    Snapshot,
    Decide,
    Apply,
    Report,
}
