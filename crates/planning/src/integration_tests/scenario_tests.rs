use crate::driving_mode::DrivingMode;
use crate::scenario::{collect_reports, Scenario, ScenarioError};
use crate::test_harness::TestScenario;

/// Crossing: 1 -> 3 -> 4 and 2 -> 3 -> 5, stop line at 3.
const CROSSING: &str = r#"{
    "params": { "conflict": { "enabled": true } },
    "waypoints": [
        { "id": 1, "x": -50.0, "y": 0.0 },
        { "id": 2, "x": 0.0, "y": -50.0 },
        { "id": 3, "x": 0.0, "y": 0.0 },
        { "id": 4, "x": 50.0, "y": 0.0 },
        { "id": 5, "x": 0.0, "y": 50.0 }
    ],
    "links": [[1, 3], [2, 3], [3, 4], [3, 5]],
    "segments": [
        { "kind": "straight", "start": [-50.0, 0.0], "end": [50.0, 0.0] },
        { "kind": "straight", "start": [0.0, -50.0], "end": [0.0, 50.0] }
    ],
    "vehicles": [
        { "id": 1, "max_speed": 12.0, "position": [-20.0, 0.0], "route": [1, 4], "stop_at": 3, "segment": 0 },
        { "id": 2, "max_speed": 12.0, "position": [0.0, -30.0], "route": [2, 5], "stop_at": 3, "segment": 1 },
        {
            "id": 3, "speed": 9.0, "max_speed": 14.0, "position": [10.0, 0.0],
            "sensors": { "vehicle_detected": true, "distance_to_leading_vehicle": 25.0, "leading_vehicle_speed": 0.0 },
            "path": [1, 3, 4], "last_waypoint": 3, "segment": 0
        }
    ]
}"#;

#[test]
fn test_crossing_scenario_end_to_end() {
    let scenario = Scenario::from_json(CROSSING).unwrap();
    let mut harness = TestScenario::from_scenario(&scenario).unwrap();
    harness.tick(1);

    let reports = collect_reports(harness.world_mut());
    assert_eq!(reports.len(), 3);
    assert_eq!(
        reports.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    // stationary at the stop line: 1 has priority, 2 yields
    assert_eq!(reports[0].mode, DrivingMode::ApproachIntersection);
    assert!((reports[0].decision.dist_to_stop - 20.0).abs() < 1e-9);
    assert_eq!(reports[1].mode, DrivingMode::Stop);
    assert!((reports[1].decision.dist_to_stop - 30.0).abs() < 1e-9);

    // already through the crossing and closing on slower traffic
    assert_eq!(reports[2].mode, DrivingMode::Platoon);
    assert_eq!(reports[2].mode_code, 2);
    assert_eq!(reports[2].decision.distance_reference, 25.0);

    let lane = reports[1].s.zip(reports[1].d).unwrap();
    assert!((lane.0 - 20.0).abs() < 1e-9);
    assert!(lane.1.abs() < 1e-9);
}

#[test]
fn test_reports_serialize_as_json_lines() {
    let scenario = Scenario::from_json(CROSSING).unwrap();
    let mut harness = TestScenario::from_scenario(&scenario).unwrap();
    harness.tick(1);

    let line = serde_json::to_string(&collect_reports(harness.world_mut())[1]).unwrap();
    assert!(line.contains("\"mode\":\"Stop\""));
    assert!(line.contains("\"mode_code\":3"));
}

#[test]
fn test_invalid_scenario_leaves_harness_unbuilt() {
    let mut scenario = Scenario::from_json(CROSSING).unwrap();
    scenario.vehicles[0].route = Some([4, 1]);
    assert!(TestScenario::from_scenario(&scenario).is_err());
}

#[test]
fn test_shared_vehicle_id_leaves_harness_unbuilt() {
    let mut scenario = Scenario::from_json(CROSSING).unwrap();
    scenario.vehicles[2].id = 2;
    assert!(matches!(
        TestScenario::from_scenario(&scenario),
        Err(ScenarioError::DuplicateVehicleId { vehicle: 2 })
    ));
}

#[test]
fn test_path_not_containing_last_waypoint_leaves_harness_unbuilt() {
    let mut scenario = Scenario::from_json(CROSSING).unwrap();
    scenario.vehicles[2].path = Some(vec![4, 3]);
    scenario.vehicles[2].last_waypoint = Some(2);
    assert!(matches!(
        TestScenario::from_scenario(&scenario),
        Err(ScenarioError::InvalidPath { vehicle: 3, .. })
    ));
}
