//! Criterion benchmark: one full planning tick at scale.
//!
//! Measures a single `FixedUpdate` run (snapshot, classify, lane frames,
//! apply, stats) with 100, 1K and 10K vehicles. Every vehicle sits on one of
//! four lanes converging on a shared crossing waypoint, is stationary, and
//! has a lead vehicle in sensor range, so the resolver and every classifier
//! branch do real work.
//!
//! Run with: cargo bench -p planning --bench full_tick_bench --features bench

use bevy::math::DVec2;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use planning::geometry::RoadSegment;
use planning::planner_params::PlannerParams;
use planning::test_harness::TestScenario;
use planning::vehicle::{PathInfo, VehicleDynamics, VehicleSensors, WaypointId};

const CROSSING: u32 = 100;

fn build_scenario(vehicle_count: u32) -> TestScenario {
    let mut scenario = TestScenario::new()
        .with_params(PlannerParams::with_conflict_resolution())
        .with_waypoint(CROSSING, 0.0, 0.0)
        .with_segment(RoadSegment::straight(
            DVec2::new(-500.0, 0.0),
            DVec2::new(500.0, 0.0),
        ));

    for i in 0..vehicle_count {
        let lane = i % 4;
        let dynamics = VehicleDynamics {
            speed: 0.0,
            max_speed: 15.0,
            position: DVec2::new(-((i / 4) as f64) * 8.0, 0.0),
        };
        let sensors = VehicleSensors {
            vehicle_detected: true,
            distance_to_leading_vehicle: 8.0,
            leading_vehicle_speed: 0.0,
            ..Default::default()
        };
        let path = PathInfo::new(vec![WaypointId(lane), WaypointId(CROSSING)])
            .with_stop_at(WaypointId(CROSSING));
        let entity = scenario.spawn_vehicle(i, dynamics, sensors, path);
        scenario.place_on_segment(entity, 0);
    }

    // warm up: lane frames inserted, registry populated
    scenario.tick(1);
    scenario
}

fn bench_full_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_tick");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(20));

    for &count in &[100u32, 1_000, 10_000] {
        let mut scenario = build_scenario(count);
        group.bench_with_input(BenchmarkId::new("vehicles", count), &count, |b, _| {
            b.iter(|| scenario.tick(1));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_full_tick);
criterion_main!(benches);
