//! Configuration System
//!
//! Loads run parameters from tuning.toml so experiments can be adjusted
//! without recompiling. Command line flags override what is loaded here.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::boredom::{BoredomStrategy, HISTORY_CONSIDER_SIZE};
use crate::setup::Experiment;
use enact_events::TRACE_WINDOW;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "tuning.toml";

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub simulation: SimulationConfig,
    pub boredom: BoredomConfig,
    pub agents: AgentConfig,
    pub trace: TraceConfig,
}

/// Simulation parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub ticks: u64,
    pub seed: u64,
    pub experiment: Experiment,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks: 1000,
            seed: 42,
            experiment: Experiment::default(),
        }
    }
}

/// Boredom handler selection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoredomConfig {
    pub strategy: BoredomStrategy,
    /// Recent history entries the repetitive handlers look at
    pub history_consider_size: usize,
}

impl Default for BoredomConfig {
    fn default() -> Self {
        Self {
            strategy: BoredomStrategy::default(),
            history_consider_size: HISTORY_CONSIDER_SIZE,
        }
    }
}

/// Agent decision parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Chance of attempting a random action instead of the best one
    pub exploration_rate: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { exploration_rate: 0.1 }
    }
}

/// Trace output
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub window: usize,
    pub traces_path: Option<PathBuf>,
    pub events_path: Option<PathBuf>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            window: TRACE_WINDOW,
            traces_path: None,
            events_path: None,
        }
    }
}

impl SimConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parse configuration from TOML text; missing keys take defaults
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_TUNING_PATH).unwrap_or_else(|e| {
            tracing::warn!("could not load {}: {}; using defaults", DEFAULT_TUNING_PATH, e);
            Self::default()
        })
    }
}

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
