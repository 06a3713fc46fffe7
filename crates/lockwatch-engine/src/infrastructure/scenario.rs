//! Simulation Scenarios
//!
//! A scenario is an engine configuration plus one script per process actor.
//! JSON form:
//!
//! ```text
//! {
//!   "processes": 2, "resources": 2, "initial_available": [1, 1],
//!   "detection_interval_ms": 5000, "duration_ms": 20000,
//!   "actors": [
//!     [{"op": "request", "resource": 0, "count": 1}, {"op": "sleep", "ms": 1000},
//!      {"op": "request", "resource": 1, "count": 1}],
//!     [{"op": "request", "resource": 1, "count": 1}, {"op": "sleep", "ms": 1000},
//!      {"op": "request", "resource": 0, "count": 1}]
//!   ]
//! }
//! ```

use super::config::{millis, EngineConfig};
use crate::domain::{ConfigError, ProcessId, ResourceId};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Reference simulation length
pub const DEFAULT_RUN_DURATION: Duration = Duration::from_secs(20);

/// One scripted action of a process actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Ask for units
    Request { resource: ResourceId, count: u32 },
    /// Return units
    Release { resource: ResourceId, count: u32 },
    /// Pause the actor
    Sleep { ms: u64 },
}

impl Step {
    /// Request shorthand
    pub const fn request(resource: usize, count: u32) -> Self {
        Self::Request {
            resource: ResourceId(resource),
            count,
        }
    }

    /// Release shorthand
    pub const fn release(resource: usize, count: u32) -> Self {
        Self::Release {
            resource: ResourceId(resource),
            count,
        }
    }

    /// Sleep shorthand
    pub const fn sleep(ms: u64) -> Self {
        Self::Sleep { ms }
    }
}

/// Ordered steps for one process; an empty script is an idle process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorScript {
    /// Steps executed in order
    pub steps: Vec<Step>,
}

impl ActorScript {
    /// Wrap a step list
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }
}

/// Everything needed to run a simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Ledger and detector parameters
    #[serde(flatten)]
    pub engine: EngineConfig,

    /// Wall-clock run time before every task is torn down
    #[serde(rename = "duration_ms", with = "millis", default = "default_duration")]
    pub duration: Duration,

    /// Script for process `i` at index `i`; missing entries are idle
    #[serde(default)]
    pub actors: Vec<ActorScript>,
}

fn default_duration() -> Duration {
    DEFAULT_RUN_DURATION
}

impl SimulationConfig {
    /// Three processes in a circular wait plus one idle process
    ///
    /// N=4, R=3, Available=[1,1,1]. P0 takes R0 then wants R1, P1 takes R1
    /// then wants R2, P2 takes R2 then wants R0. P3 never asks for anything.
    pub fn circular_wait() -> Self {
        let chain = |first: usize, second: usize| {
            ActorScript::new(vec![
                Step::request(first, 1),
                Step::sleep(1_000),
                Step::request(second, 1),
            ])
        };

        Self {
            engine: EngineConfig::default(),
            duration: DEFAULT_RUN_DURATION,
            actors: vec![chain(0, 1), chain(1, 2), chain(2, 0), ActorScript::default()],
        }
    }

    /// Parse a JSON scenario and validate it
    ///
    /// # Errors
    /// `Parse` on malformed JSON, otherwise any [`validate`](Self::validate) error.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON scenario file
    ///
    /// # Errors
    /// `Io` when the file cannot be read, otherwise as [`from_json_str`](Self::from_json_str).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    /// Script for `process`, idle if none was given
    pub fn script(&self, process: ProcessId) -> &[Step] {
        self.actors
            .get(process.as_usize())
            .map(|script| script.steps.as_slice())
            .unwrap_or(&[])
    }

    /// Check the engine config and every step's bounds
    ///
    /// # Errors
    /// Engine errors, `ZeroDuration`, `TooManyScripts`,
    /// or `InvalidStep` for an out-of-range resource or a zero count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if self.duration.is_zero() {
            return Err(ConfigError::ZeroDuration);
        }
        if self.actors.len() > self.engine.processes {
            return Err(ConfigError::TooManyScripts {
                scripts: self.actors.len(),
                processes: self.engine.processes,
            });
        }

        for (pid, script) in self.actors.iter().enumerate() {
            for (index, step) in script.steps.iter().enumerate() {
                let (resource, count) = match *step {
                    Step::Request { resource, count } | Step::Release { resource, count } => {
                        (resource, count)
                    }
                    Step::Sleep { .. } => continue,
                };

                let reason = if resource.as_usize() >= self.engine.resources {
                    format!("{resource} is outside 0..{}", self.engine.resources)
                } else if count == 0 {
                    "unit count must be positive".to_string()
                } else {
                    continue;
                };
                return Err(ConfigError::InvalidStep {
                    process: ProcessId(pid),
                    step: index,
                    reason,
                });
            }
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::circular_wait()
    }
}
