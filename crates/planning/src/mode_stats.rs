use bevy::prelude::*;

use crate::driving_mode::{DrivingMode, DrivingModeChanged, DrivingModeState};

/// Fleet-wide driving-mode counts, refreshed every tick after the apply step.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct DrivingModeStats {
    pub cruise: u32,
    pub platoon: u32,
    pub stop: u32,
    pub approach_intersection: u32,
    /// Mode transitions observed since startup.
    pub transitions: u64,
}

impl DrivingModeStats {
    pub fn count(&self, mode: DrivingMode) -> u32 {
        match mode {
            DrivingMode::Cruise => self.cruise,
            DrivingMode::Platoon => self.platoon,
            DrivingMode::Stop => self.stop,
            DrivingMode::ApproachIntersection => self.approach_intersection,
        }
    }

    pub fn total(&self) -> u32 {
        DrivingMode::ALL.iter().map(|&m| self.count(m)).sum()
    }

    fn slot(&mut self, mode: DrivingMode) -> &mut u32 {
        match mode {
            DrivingMode::Cruise => &mut self.cruise,
            DrivingMode::Platoon => &mut self.platoon,
            DrivingMode::Stop => &mut self.stop,
            DrivingMode::ApproachIntersection => &mut self.approach_intersection,
        }
    }
}

pub fn update_mode_stats(
    mut stats: ResMut<DrivingModeStats>,
    modes: Query<&DrivingModeState>,
    mut changed: EventReader<DrivingModeChanged>,
) {
    let transitions = stats.transitions;
    *stats = DrivingModeStats {
        transitions,
        ..Default::default()
    };
    for state in &modes {
        *stats.slot(state.0) += 1;
    }

    for event in changed.read() {
        stats.transitions += 1;
        info!(
            "tick {}: vehicle {} {} -> {}",
            event.tick, event.vehicle.0, event.from, event.to
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_and_total() {
        let mut stats = DrivingModeStats::default();
        *stats.slot(DrivingMode::Stop) += 2;
        *stats.slot(DrivingMode::Cruise) += 1;
        assert_eq!(stats.count(DrivingMode::Stop), 2);
        assert_eq!(stats.count(DrivingMode::Platoon), 0);
        assert_eq!(stats.total(), 3);
    }
}
