//! Configuration loading and typed config structures for the Architect simulation.
//!
//! The canonical configuration lives in `architect-config.yaml` at the project
//! root. Every section and field is optional; anything omitted falls back to
//! the defaults below.

use std::path::Path;
use std::time::Duration;

use architect_world::WaveTerrain;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration. Mirrors `architect-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ArchitectConfig {
    /// Goal, history window, and start mode.
    #[serde(default)]
    pub simulation: SimulationSettings,

    /// Artificial delays inside a tick.
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Terrain shape.
    #[serde(default)]
    pub terrain: WaveTerrain,

    /// Infrastructure connection settings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ArchitectConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for infrastructure:
    /// - `DRAGONFLY_URL` overrides `infrastructure.dragonfly_url`
    /// - `OBSERVER_PORT` overrides `infrastructure.observer_port`
    /// - `SESSION_KEY` overrides `infrastructure.session_key`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string. No env overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Simulation-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationSettings {
    /// Goal the oracle is given at session start.
    #[serde(default = "default_goal")]
    pub goal: String,

    /// How many of the most recent log lines the oracle sees.
    #[serde(default = "default_recent_log_window")]
    pub recent_log_window: usize,

    /// Whether ticks run on their own at startup.
    #[serde(default = "default_true")]
    pub autonomous: bool,

    /// Delay between a tick settling and the next autonomous tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            goal: default_goal(),
            recent_log_window: default_recent_log_window(),
            autonomous: true,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Artificial delays that pace a tick for observers.
///
/// All values are milliseconds. Zero disables the delay, which is what the
/// tests use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PacingConfig {
    /// After "Initiating Neural Uplink...".
    #[serde(default = "default_uplink_delay_ms")]
    pub uplink_delay_ms: u64,

    /// After "Accessing local sector topology map...".
    #[serde(default = "default_topology_delay_ms")]
    pub topology_delay_ms: u64,

    /// After each streamed reasoning line.
    #[serde(default = "default_reasoning_step_delay_ms")]
    pub reasoning_step_delay_ms: u64,

    /// Between the placement announcement and the commit.
    #[serde(default = "default_placement_delay_ms")]
    pub placement_delay_ms: u64,
}

impl PacingConfig {
    /// Pacing with every delay disabled.
    pub const fn instant() -> Self {
        Self {
            uplink_delay_ms: 0,
            topology_delay_ms: 0,
            reasoning_step_delay_ms: 0,
            placement_delay_ms: 0,
        }
    }

    /// `uplink_delay_ms` as a [`Duration`].
    pub const fn uplink(&self) -> Duration {
        Duration::from_millis(self.uplink_delay_ms)
    }

    /// `topology_delay_ms` as a [`Duration`].
    pub const fn topology(&self) -> Duration {
        Duration::from_millis(self.topology_delay_ms)
    }

    /// `reasoning_step_delay_ms` as a [`Duration`].
    pub const fn reasoning_step(&self) -> Duration {
        Duration::from_millis(self.reasoning_step_delay_ms)
    }

    /// `placement_delay_ms` as a [`Duration`].
    pub const fn placement(&self) -> Duration {
        Duration::from_millis(self.placement_delay_ms)
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            uplink_delay_ms: default_uplink_delay_ms(),
            topology_delay_ms: default_topology_delay_ms(),
            reasoning_step_delay_ms: default_reasoning_step_delay_ms(),
            placement_delay_ms: default_placement_delay_ms(),
        }
    }
}

/// Infrastructure connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// Dragonfly (Redis-compatible) URL for session snapshots.
    #[serde(default = "default_dragonfly_url")]
    pub dragonfly_url: String,

    /// Observer HTTP port.
    #[serde(default = "default_observer_port")]
    pub observer_port: u16,

    /// Key the session snapshot is stored under.
    #[serde(default = "default_session_key")]
    pub session_key: String,
}

impl InfrastructureConfig {
    /// Override infrastructure settings with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DRAGONFLY_URL") {
            self.dragonfly_url = val;
        }
        if let Ok(val) = std::env::var("OBSERVER_PORT")
            && let Ok(port) = val.parse()
        {
            self.observer_port = port;
        }
        if let Ok(val) = std::env::var("SESSION_KEY") {
            self.session_key = val;
        }
    }
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            dragonfly_url: default_dragonfly_url(),
            observer_port: default_observer_port(),
            session_key: default_session_key(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_goal() -> String {
    String::from("Synthesize Sustainable Modular Settlement")
}

const fn default_recent_log_window() -> usize {
    20
}

const fn default_true() -> bool {
    true
}

const fn default_tick_interval_ms() -> u64 {
    4500
}

const fn default_uplink_delay_ms() -> u64 {
    400
}

const fn default_topology_delay_ms() -> u64 {
    600
}

const fn default_reasoning_step_delay_ms() -> u64 {
    600
}

const fn default_placement_delay_ms() -> u64 {
    800
}

fn default_dragonfly_url() -> String {
    String::from("redis://localhost:6379")
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_session_key() -> String {
    String::from("default")
}

fn default_log_level() -> String {
    String::from("info")
}
