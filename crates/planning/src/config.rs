/// Upper bound applied to the distance reference handed to the platoon controller.
pub const DISTANCE_REFERENCE_CAP: f64 = 1000.0;

/// Seconds of headway used to scale the "far enough to ignore" lead distance.
pub const HEADWAY_SECONDS: f64 = 1.4;

/// Fixed margin (metres) added on top of the speed-scaled ignore distance.
pub const DETECTION_MARGIN: f64 = 25.0;

/// Value written into distance/speed outputs that do not apply (vehicle inactive).
pub const INACTIVE_SENTINEL: f64 = -1.0;

/// Planning tick rate. One classifier evaluation per vehicle per tick.
pub const TICK_HZ: f64 = 10.0;

/// Tolerance used when comparing geometric lengths against zero.
pub const GEOMETRY_EPSILON: f64 = 1e-12;

/// Speeds below this magnitude count as standing still for right-of-way.
pub const STATIONARY_SPEED_EPSILON: f64 = 1e-6;
