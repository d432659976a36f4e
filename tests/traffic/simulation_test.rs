/*!
 * Traffic Simulation Tests
 * Mutual exclusion under many concurrent vehicles
 */

use std::time::Duration;
use synch_kernel::traffic::{ConflictPolicy, SimulationConfig, TrafficSimulation};

#[test]
fn test_stress_run_has_no_collisions() {
    let config = SimulationConfig::quick()
        .with_vehicles(16)
        .with_crossings(25)
        .with_seed(2024);
    let total = config.total_crossings() as u64;

    let report = TrafficSimulation::init(config).unwrap().run().unwrap();
    assert!(report.is_clean(), "{:?}", report.violations);
    assert_eq!(report.crossings, total);
    assert_eq!(report.gate.inside(), 0);
    assert!(report.max_concurrent >= 1);
    assert_eq!(report.exempt_overlaps, 0);
}

#[test]
fn test_no_delay_run_has_no_collisions() {
    let mut config = SimulationConfig::quick().with_vehicles(8).with_crossings(200);
    config.max_crossing_time = Duration::ZERO;
    config.max_arrival_delay = Duration::ZERO;

    let report = TrafficSimulation::init(config).unwrap().run().unwrap();
    assert!(report.is_clean(), "{:?}", report.violations);
}

#[test]
fn test_directional_policy_has_no_collisions() {
    for seed in [3, 99, 2024] {
        let mut config = SimulationConfig::quick()
            .with_vehicles(16)
            .with_crossings(50)
            .with_policy(ConflictPolicy::Directional)
            .with_seed(seed);
        config.max_arrival_delay = Duration::ZERO;

        let report = TrafficSimulation::init(config).unwrap().run().unwrap();
        assert!(report.is_clean(), "seed {seed}: {:?}", report.violations);
        assert_eq!(report.gate.admitted, report.gate.departed);
    }
}

#[test]
fn test_report_serializes() {
    let report = TrafficSimulation::init(SimulationConfig::quick())
        .unwrap()
        .run()
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["vehicles"], 4);
    assert!(json["violations"].as_array().unwrap().is_empty());
}
