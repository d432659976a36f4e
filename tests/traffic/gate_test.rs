/*!
 * Intersection Gate Tests
 * Admission scenarios and wake-up behaviour
 */

use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use synch_kernel::traffic::{ConflictPolicy, Direction, IntersectionGate, Path};

use Direction::{East, North, South, West};

#[test]
fn test_reciprocal_paths_both_admitted() {
    let gate = IntersectionGate::new();
    gate.enter(North, South);
    assert!(gate.try_enter(South, North));

    let snapshot = gate.snapshot();
    assert_eq!(snapshot.inside(Path::new(North, South)), 1);
    assert_eq!(snapshot.inside(Path::new(South, North)), 1);

    gate.exit(North, South);
    gate.exit(South, North);
    assert!(gate.is_idle());
}

#[test]
fn test_right_turn_admitted_beside_through_traffic() {
    let gate = IntersectionGate::new();
    gate.enter(South, North);
    assert!(gate.try_enter(North, West));

    gate.exit(North, West);
    gate.exit(South, North);
    assert!(gate.is_idle());
}

#[test]
fn test_same_origin_shares_intersection() {
    let gate = IntersectionGate::new();
    gate.enter(East, West);
    gate.enter(East, North);
    gate.enter(East, South);
    gate.enter(East, East);
    assert_eq!(gate.snapshot().total_inside(), 4);

    for dest in Direction::ALL {
        gate.exit(East, dest);
    }
    assert!(gate.is_idle());
}

#[test]
fn test_crossing_traffic_blocks_until_exit() {
    let gate = Arc::new(IntersectionGate::new());
    gate.enter(East, West);

    let entered = Arc::new(AtomicBool::new(false));
    let vehicle = {
        let gate = Arc::clone(&gate);
        let entered = Arc::clone(&entered);
        thread::spawn(move || {
            gate.enter(North, South);
            entered.store(true, Ordering::SeqCst);
            gate.exit(North, South);
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!entered.load(Ordering::SeqCst));
    assert!(!gate.try_enter(North, South));

    gate.exit(East, West);
    vehicle.join().unwrap();
    assert!(entered.load(Ordering::SeqCst));
    assert!(gate.is_idle());

    let stats = gate.stats();
    assert_eq!(stats.admitted, 2);
    assert_eq!(stats.departed, 2);
    assert!(stats.broadcasts >= 1);
}

#[test]
fn test_waiters_from_every_origin_released() {
    let gate = Arc::new(IntersectionGate::new());
    // South->West makes a left turn across every approach but its own
    gate.enter(South, West);

    let vehicles: Vec<_> = [(North, South), (East, West), (West, East)]
        .into_iter()
        .map(|(origin, dest)| {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let _guard = gate.cross(origin, dest);
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(20));
    gate.exit(South, West);

    for vehicle in vehicles {
        vehicle.join().unwrap();
    }
    assert!(gate.is_idle());
}

#[test]
fn test_directional_never_blocks_u_turns() {
    let gate = IntersectionGate::with_policy(ConflictPolicy::Directional);
    gate.enter(East, West);
    assert!(gate.try_enter(North, North));
    gate.exit(North, North);
    gate.exit(East, West);
    assert!(gate.is_idle());
}
