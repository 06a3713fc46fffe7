//! Engine Configuration
//!
//! Startup parameters: process count N, resource type count R, the initial
//! Available vector and the detection interval. Loaded from JSON with
//! `serde`, where durations travel as milliseconds.

use crate::domain::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reference detection interval
pub const DEFAULT_DETECTION_INTERVAL: Duration = Duration::from_secs(5);

/// Ledger shape, starting inventory and detection cadence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of processes (N)
    pub processes: usize,

    /// Number of resource types (R)
    pub resources: usize,

    /// Starting Available vector, length R
    pub initial_available: Vec<u32>,

    /// Time between detection passes
    #[serde(
        rename = "detection_interval_ms",
        with = "millis",
        default = "default_interval"
    )]
    pub detection_interval: Duration,
}

fn default_interval() -> Duration {
    DEFAULT_DETECTION_INTERVAL
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            processes: 4,
            resources: 3,
            initial_available: vec![1, 1, 1],
            detection_interval: DEFAULT_DETECTION_INTERVAL,
        }
    }
}

impl EngineConfig {
    /// Start a builder from the defaults
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check every startup invariant
    ///
    /// # Errors
    /// `NoProcesses`, `NoResources`, `InventoryLength`, `ZeroInterval`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processes == 0 {
            return Err(ConfigError::NoProcesses);
        }
        if self.resources == 0 {
            return Err(ConfigError::NoResources);
        }
        if self.initial_available.len() != self.resources {
            return Err(ConfigError::InventoryLength {
                expected: self.resources,
                actual: self.initial_available.len(),
            });
        }
        if self.detection_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }
}

/// Builder for [`EngineConfig`]
///
/// # Example
///
/// ```rust
/// use lockwatch_engine::infrastructure::EngineConfig;
/// use std::time::Duration;
///
/// let config = EngineConfig::builder()
///     .processes(3)
///     .inventory(vec![0, 0])
///     .detection_interval(Duration::from_millis(250))
///     .build()
///     .unwrap();
/// assert_eq!(config.resources, 2);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the number of processes
    pub fn processes(mut self, processes: usize) -> Self {
        self.config.processes = processes;
        self
    }

    /// Set the starting inventory; R follows its length
    pub fn inventory(mut self, available: Vec<u32>) -> Self {
        self.config.resources = available.len();
        self.config.initial_available = available;
        self
    }

    /// Set the detection interval
    pub fn detection_interval(mut self, interval: Duration) -> Self {
        self.config.detection_interval = interval;
        self
    }

    /// Validate and return the configuration
    ///
    /// # Errors
    /// See [`EngineConfig::validate`].
    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// `Duration` as integer milliseconds
pub(crate) mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
