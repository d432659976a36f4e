/*!
 * Traffic Simulation Driver
 *
 * Spawns vehicle threads that repeatedly cross the intersection through an
 * [`IntersectionGate`], while a [`CrossingMonitor`] checking the same policy
 * verifies that no vehicle is ever admitted onto a path an occupant forbids.
 */

use super::config::SimulationConfig;
use super::direction::{Direction, Path};
use super::gate::IntersectionGate;
use super::monitor::{CrossingMonitor, Violation};
use super::stats::GateStatsSnapshot;
use crate::core::errors::KernelError;
use crate::core::types::KernelResult;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of one simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub vehicles: usize,
    pub crossings: u64,
    pub elapsed: Duration,
    pub max_concurrent: u32,
    pub violations: Vec<Violation>,
    /// Conflicting overlaps the gate's policy allowed
    pub exempt_overlaps: u64,
    pub gate: GateStatsSnapshot,
    /// All counters back at zero after the last vehicle left
    pub idle_at_end: bool,
}

impl SimulationReport {
    /// No collisions and nothing left behind
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.idle_at_end
    }
}

/// One configured simulation owning its gate
pub struct TrafficSimulation {
    config: SimulationConfig,
    gate: IntersectionGate,
    monitor: CrossingMonitor,
}

impl TrafficSimulation {
    /// Validate the configuration and set up the gate
    pub fn init(config: SimulationConfig) -> KernelResult<Self> {
        config.validate()?;
        info!(
            vehicles = config.vehicles,
            crossings = config.crossings_per_vehicle,
            policy = ?config.policy,
            "traffic simulation initialized"
        );
        Ok(Self {
            gate: IntersectionGate::with_policy(config.policy),
            monitor: CrossingMonitor::with_policy(config.policy),
            config,
        })
    }

    #[inline]
    pub fn gate(&self) -> &IntersectionGate {
        &self.gate
    }

    #[inline]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run every vehicle to completion
    ///
    /// Fails with `InitializationFailure` if a vehicle thread cannot be
    /// started; vehicles already on the road still finish their crossings.
    /// A panic on a vehicle thread is propagated.
    pub fn run(&self) -> KernelResult<SimulationReport> {
        let start = Instant::now();

        let spawned: KernelResult<()> = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.config.vehicles);
            let mut failure = None;

            for vehicle in 0..self.config.vehicles {
                let spawn = thread::Builder::new()
                    .name(format!("vehicle-{vehicle}"))
                    .spawn_scoped(scope, move || self.drive(vehicle));
                match spawn {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        failure = Some(KernelError::initialization(format!(
                            "cannot start vehicle thread {vehicle}: {e}"
                        )));
                        break;
                    }
                }
            }

            for handle in handles {
                if let Err(panic) = handle.join() {
                    std::panic::resume_unwind(panic);
                }
            }

            failure.map_or(Ok(()), Err)
        });
        spawned?;

        let gate = self.gate.shutdown();
        let report = SimulationReport {
            vehicles: self.config.vehicles,
            crossings: gate.departed,
            elapsed: start.elapsed(),
            max_concurrent: self.monitor.max_concurrent(),
            violations: self.monitor.violations(),
            exempt_overlaps: self.monitor.exempt_overlaps(),
            gate,
            idle_at_end: self.gate.is_idle() && self.monitor.is_empty(),
        };

        if report.is_clean() {
            info!(
                crossings = report.crossings,
                max_concurrent = report.max_concurrent,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "traffic simulation finished"
            );
        } else {
            warn!(
                violations = report.violations.len(),
                idle = report.idle_at_end,
                "traffic simulation finished with violations"
            );
        }
        Ok(report)
    }

    fn drive(&self, vehicle: usize) {
        let mut rng = StdRng::seed_from_u64(
            self.config
                .seed
                .wrapping_add((vehicle as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        );

        for crossing in 0..self.config.crossings_per_vehicle {
            pause(&mut rng, self.config.max_arrival_delay);

            let path = Path::new(
                Direction::from_index(rng.gen_range(0..4)),
                Direction::from_index(rng.gen_range(0..4)),
            );

            self.gate.enter(path.origin, path.destination);
            self.monitor.arrive(path);
            pause(&mut rng, self.config.max_crossing_time);
            self.monitor.depart(path);
            self.gate.exit(path.origin, path.destination);

            debug!(vehicle, crossing, %path, "crossing complete");
        }
    }
}

fn pause(rng: &mut StdRng, max: Duration) {
    let max_us = max.as_micros() as u64;
    if max_us > 0 {
        thread::sleep(Duration::from_micros(rng.gen_range(0..=max_us)));
    }
}
