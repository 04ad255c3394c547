//! Registry configuration

use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default shutdown timeout for background workers (5 seconds)
///
/// Used when workers are stopped on drop. For custom timeout control, set
/// [`RegistryConfig::shutdown_timeout_ms`].
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default pause of the performance-mode worker between two queue drains
pub const DEFAULT_PERFORMANCE_INTERVAL: Duration = Duration::from_secs(1);

/// Tag of the sink attached to a log that has none when it first logs
pub const DEFAULT_SINK_TYPE: &str = "console";

/// Indentation of non-highlighted logs while some log is highlighted
pub const DEFAULT_HIGHLIGHT_INDENT: &str = "    ";

/// Settings of a [`Registry`](super::registry::Registry)
///
/// # Example
///
/// ```
/// use rust_unit_logging::{LogLevel, RegistryConfig};
///
/// let config = RegistryConfig {
///     default_level: LogLevel::Info,
///     performance_interval_ms: 50,
///     ..RegistryConfig::default()
/// };
/// assert_eq!(config.default_sink, "console");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Level of logs created without an explicit level
    pub default_level: LogLevel,
    /// Sink type attached to a log that has no sink at its first message
    pub default_sink: String,
    /// Pause of the performance-mode worker between queue drains
    pub performance_interval_ms: u64,
    /// Bounded wait when stopping background workers
    pub shutdown_timeout_ms: u64,
    pub highlight_indent: String,
}

impl RegistryConfig {
    pub fn performance_interval(&self) -> Duration {
        Duration::from_millis(self.performance_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_level: LogLevel::All,
            default_sink: DEFAULT_SINK_TYPE.to_string(),
            performance_interval_ms: DEFAULT_PERFORMANCE_INTERVAL.as_millis() as u64,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT.as_millis() as u64,
            highlight_indent: DEFAULT_HIGHLIGHT_INDENT.to_string(),
        }
    }
}
