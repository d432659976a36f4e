/*!
 * Simulation Configuration
 *
 * Runtime configuration for the traffic simulation driver
 */

use super::conflict::ConflictPolicy;
use crate::core::errors::KernelError;
use crate::core::limits::{
    DEFAULT_CROSSINGS_PER_VEHICLE, DEFAULT_MAX_ARRIVAL_DELAY, DEFAULT_MAX_CROSSING_TIME,
    DEFAULT_VEHICLES, MAX_CROSSINGS_PER_VEHICLE, MAX_VEHICLES,
};
use crate::core::types::KernelResult;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Traffic simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Vehicle threads to spawn
    pub vehicles: usize,
    /// Crossings each vehicle makes
    pub crossings_per_vehicle: usize,
    /// Upper bound on time spent inside the intersection
    pub max_crossing_time: Duration,
    /// Upper bound on the pause between crossings
    pub max_arrival_delay: Duration,
    /// Conflict policy of the gate
    pub policy: ConflictPolicy,
    /// RNG seed; each vehicle derives its own stream from it
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            vehicles: DEFAULT_VEHICLES,
            crossings_per_vehicle: DEFAULT_CROSSINGS_PER_VEHICLE,
            max_crossing_time: DEFAULT_MAX_CROSSING_TIME,
            max_arrival_delay: DEFAULT_MAX_ARRIVAL_DELAY,
            policy: ConflictPolicy::default(),
            seed: 161,
        }
    }
}

impl SimulationConfig {
    /// Many short crossings, for shaking out races
    pub const fn stress() -> Self {
        Self {
            vehicles: 32,
            crossings_per_vehicle: 200,
            max_crossing_time: Duration::from_micros(50),
            max_arrival_delay: Duration::ZERO,
            policy: ConflictPolicy::Symmetric,
            seed: 0x5eed,
        }
    }

    /// A handful of crossings, for quick smoke runs
    pub const fn quick() -> Self {
        Self {
            vehicles: 4,
            crossings_per_vehicle: 5,
            max_crossing_time: Duration::from_micros(200),
            max_arrival_delay: Duration::from_micros(100),
            policy: ConflictPolicy::Symmetric,
            seed: 7,
        }
    }

    #[must_use]
    pub fn with_vehicles(mut self, vehicles: usize) -> Self {
        self.vehicles = vehicles;
        self
    }

    #[must_use]
    pub fn with_crossings(mut self, crossings: usize) -> Self {
        self.crossings_per_vehicle = crossings;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Defaults overridden by environment variables
    ///
    /// - KERNEL_SIM_VEHICLES
    /// - KERNEL_SIM_CROSSINGS
    /// - KERNEL_SIM_CROSSING_US (max crossing time, microseconds)
    /// - KERNEL_SIM_ARRIVAL_US (max arrival delay, microseconds)
    /// - KERNEL_SIM_POLICY (`symmetric` | `directional`)
    /// - KERNEL_SIM_SEED
    pub fn from_env() -> KernelResult<Self> {
        let mut config = Self::default();

        if let Some(v) = env_parse::<usize>("KERNEL_SIM_VEHICLES")? {
            config.vehicles = v;
        }
        if let Some(v) = env_parse::<usize>("KERNEL_SIM_CROSSINGS")? {
            config.crossings_per_vehicle = v;
        }
        if let Some(v) = env_parse::<u64>("KERNEL_SIM_CROSSING_US")? {
            config.max_crossing_time = Duration::from_micros(v);
        }
        if let Some(v) = env_parse::<u64>("KERNEL_SIM_ARRIVAL_US")? {
            config.max_arrival_delay = Duration::from_micros(v);
        }
        if let Ok(v) = std::env::var("KERNEL_SIM_POLICY") {
            config.policy = ConflictPolicy::parse(&v).ok_or_else(|| {
                KernelError::invalid_argument(format!("KERNEL_SIM_POLICY: unknown policy {v:?}"))
            })?;
        }
        if let Some(v) = env_parse::<u64>("KERNEL_SIM_SEED")? {
            config.seed = v;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> KernelResult<()> {
        if self.vehicles == 0 || self.vehicles > MAX_VEHICLES {
            return Err(KernelError::invalid_argument(format!(
                "vehicles must be in 1..={MAX_VEHICLES}, got {}",
                self.vehicles
            )));
        }
        if self.crossings_per_vehicle == 0
            || self.crossings_per_vehicle > MAX_CROSSINGS_PER_VEHICLE
        {
            return Err(KernelError::invalid_argument(format!(
                "crossings_per_vehicle must be in 1..={MAX_CROSSINGS_PER_VEHICLE}, got {}",
                self.crossings_per_vehicle
            )));
        }
        Ok(())
    }

    /// Crossings a full run makes, saturating for unvalidated configs
    pub fn total_crossings(&self) -> usize {
        self.vehicles.saturating_mul(self.crossings_per_vehicle)
    }
}

fn env_parse<T: FromStr>(key: &str) -> KernelResult<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| KernelError::invalid_argument(format!("{key}: cannot parse {raw:?}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.total_crossings(), DEFAULT_VEHICLES * DEFAULT_CROSSINGS_PER_VEHICLE);
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(SimulationConfig::stress().validate().is_ok());
        assert!(SimulationConfig::quick().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_vehicles() {
        let config = SimulationConfig::default().with_vehicles(0);
        assert!(matches!(
            config.validate(),
            Err(KernelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validate_bounds_crossings() {
        let at_limit = SimulationConfig::default().with_crossings(MAX_CROSSINGS_PER_VEHICLE);
        assert!(at_limit.validate().is_ok());

        for crossings in [0, MAX_CROSSINGS_PER_VEHICLE + 1, usize::MAX] {
            let config = SimulationConfig::default().with_crossings(crossings);
            assert!(
                matches!(config.validate(), Err(KernelError::InvalidArgument(_))),
                "{crossings}"
            );
        }
    }

    #[test]
    fn test_total_crossings_saturates() {
        let config = SimulationConfig::default()
            .with_vehicles(usize::MAX)
            .with_crossings(usize::MAX);
        assert_eq!(config.total_crossings(), usize::MAX);
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_huge_crossings() {
        std::env::set_var("KERNEL_SIM_CROSSINGS", usize::MAX.to_string());
        let result = SimulationConfig::from_env();
        std::env::remove_var("KERNEL_SIM_CROSSINGS");

        assert!(matches!(result, Err(KernelError::InvalidArgument(_))));
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        std::env::set_var("KERNEL_SIM_VEHICLES", "3");
        std::env::set_var("KERNEL_SIM_POLICY", "directional");
        let config = SimulationConfig::from_env().unwrap();
        std::env::remove_var("KERNEL_SIM_VEHICLES");
        std::env::remove_var("KERNEL_SIM_POLICY");

        assert_eq!(config.vehicles, 3);
        assert_eq!(config.policy, ConflictPolicy::Directional);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_garbage() {
        std::env::set_var("KERNEL_SIM_CROSSINGS", "many");
        let result = SimulationConfig::from_env();
        std::env::remove_var("KERNEL_SIM_CROSSINGS");

        assert!(matches!(result, Err(KernelError::InvalidArgument(_))));
    }
}
