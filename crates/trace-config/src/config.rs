//! Configuration types and loading for trace.
//!
//! [`TraceConfig`] is the contents of `.trace/config.yaml`. [`load_config`]
//! layers built-in defaults, the YAML file and `TRACE_*` environment
//! variables; [`save_config`] writes the YAML file back.

use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trace_core::{Color, CurveDefaults, DanglingPolicy, SessionOptions};

/// File name of the configuration inside `.trace/`.
pub const CONFIG_FILE: &str = "config.yaml";

/// Prefix of environment overrides (`TRACE_EDIT_DELAY_MS=50`,
/// `TRACE_CURVE_DEFAULTS__USE_LIVE_DATA=true`).
pub const ENV_PREFIX: &str = "TRACE_";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The configuration could not be serialized.
    #[error("failed to write config file: {0}")]
    SerializeError(#[from] serde_yaml::Error),

    /// A layer (file or environment) held an invalid value.
    #[error("failed to load configuration: {0}")]
    LoadError(#[from] Box<figment::Error>),

    /// The `.trace/` directory was not found.
    #[error("no .trace directory found (run 'trace init' first)")]
    TraceDirNotFound,

    /// A configuration value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue {
        /// The configuration key that had an invalid value.
        key: String,
        /// A description of why the value is invalid.
        reason: String,
    },
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// The full trace configuration, corresponding to `.trace/config.yaml`.
///
/// Every field has a default, so a partial file (or none at all) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Milliseconds a formula replacement waits before it commits.
    #[serde(default = "default_edit_delay_ms")]
    pub edit_delay_ms: u64,

    /// Prefix of auto-generated axis names.
    #[serde(default = "default_axis_prefix")]
    pub axis_prefix: String,

    /// What deleting a curve does to formulas that reference it.
    #[serde(default)]
    pub on_delete: DanglingPolicy,

    /// Flags given to new curves.
    #[serde(default)]
    pub curve_defaults: CurveDefaults,

    /// `#rrggbb` colors replacing the built-in palette. Empty keeps it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub palette: Vec<String>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            edit_delay_ms: default_edit_delay_ms(),
            axis_prefix: default_axis_prefix(),
            on_delete: DanglingPolicy::default(),
            curve_defaults: CurveDefaults::default(),
            palette: Vec::new(),
        }
    }
}

fn default_edit_delay_ms() -> u64 {
    10
}

fn default_axis_prefix() -> String {
    "Y-Axis".to_string()
}

impl TraceConfig {
    /// Parsed palette override, if any.
    pub fn palette_colors(&self) -> Result<Option<Vec<Color>>> {
        if self.palette.is_empty() {
            return Ok(None);
        }
        self.palette
            .iter()
            .map(|s| {
                s.parse::<Color>().map_err(|reason| ConfigError::InvalidValue {
                    key: "palette".to_string(),
                    reason,
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// Build the session options this configuration describes.
    pub fn session_options(&self) -> Result<SessionOptions> {
        let axis_prefix = self.axis_prefix.trim();
        if axis_prefix.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "axis_prefix".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(SessionOptions {
            edit_delay: Duration::from_millis(self.edit_delay_ms),
            axis_prefix: axis_prefix.to_string(),
            on_delete: self.on_delete,
            curve_defaults: self.curve_defaults,
            palette: self.palette_colors()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// The layered configuration sources for a `.trace/` directory.
///
/// Later layers win: defaults, then `config.yaml` (if present), then
/// `TRACE_*` environment variables with `__` separating nested keys.
pub fn config_sources(trace_dir: &Path) -> Figment {
    Figment::from(Serialized::defaults(TraceConfig::default()))
        .merge(Yaml::file(trace_dir.join(CONFIG_FILE)))
        .merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["dir", "layout"]))
}

/// Load configuration for the given `.trace/` directory.
///
/// A missing or empty `config.yaml` yields the defaults (plus any
/// environment overrides).
///
/// # Errors
///
/// Returns [`ConfigError::LoadError`] if a layer holds a value of the wrong
/// shape.
pub fn load_config(trace_dir: &Path) -> Result<TraceConfig> {
    let config: TraceConfig = config_sources(trace_dir).extract().map_err(Box::new)?;
    tracing::debug!(dir = %trace_dir.display(), ?config, "loaded configuration");
    Ok(config)
}

/// Save configuration to `config.yaml` inside the given `.trace/` directory,
/// creating the directory if needed.
pub fn save_config(trace_dir: &Path, config: &TraceConfig) -> Result<()> {
    std::fs::create_dir_all(trace_dir)?;

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(trace_dir.join(CONFIG_FILE), yaml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
