//! Longitudinal driving-mode classification.
//!
//! Each tick the classifier turns a vehicle's dynamics, sensor and path
//! snapshot into a [`DrivingDecision`]; a separate apply step then writes the
//! decided mode into [`DrivingModeState`].

mod classifier;
mod systems;
mod types;

pub use classifier::{classify, select_lead_mode, ClassifierInput};
pub use systems::{apply_driving_modes, classify_driving_modes};
pub use types::{
    DrivingDecision, DrivingMode, DrivingModeChanged, DrivingModeState, InvalidDrivingMode,
};
