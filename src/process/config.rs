/*!
 * Process Table Configuration
 */

use crate::core::errors::KernelError;
use crate::core::limits::{DEFAULT_MAX_PROCESSES, PID_MAX, PID_MIN};
use crate::core::types::KernelResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Live records (root included) the table holds before fork fails
    pub max_processes: usize,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            max_processes: DEFAULT_MAX_PROCESSES,
        }
    }
}

impl ProcessConfig {
    #[must_use]
    pub fn with_max_processes(mut self, max_processes: usize) -> Self {
        self.max_processes = max_processes;
        self
    }

    /// Defaults overridden by KERNEL_MAX_PROCESSES
    pub fn from_env() -> KernelResult<Self> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("KERNEL_MAX_PROCESSES") {
            config.max_processes = raw.trim().parse().map_err(|_| {
                KernelError::invalid_argument(format!("KERNEL_MAX_PROCESSES: cannot parse {raw:?}"))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> KernelResult<()> {
        let pid_space = (PID_MAX - PID_MIN + 1) as usize;
        if self.max_processes == 0 || self.max_processes > pid_space {
            return Err(KernelError::invalid_argument(format!(
                "max_processes must be in 1..={pid_space}, got {}",
                self.max_processes
            )));
        }
        Ok(())
    }
}
