//! Error types for the logging registry

use std::time::Duration;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// A new log was required under a name that is already registered
    #[error("log name already present [{name}]")]
    NameCollision { name: String },

    /// The named log is not registered
    #[error("log not present [{name}]")]
    NotFound { name: String },

    /// A build-time setting was changed after the log became active
    #[error("configuration of log [{name}] is locked: cannot change {setting} after the log is active")]
    ConfigurationLocked { name: String, setting: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Sink failure with the sink name
    #[error("Sink error ({sink}): {message}")]
    SinkError { sink: String, message: String },

    /// No factory is registered for the requested sink type
    #[error("Unknown sink type '{0}'")]
    UnknownSinkType(String),

    /// A background worker did not stop in time
    #[error("{worker} did not stop within {timeout:?}")]
    ShutdownTimeout { worker: String, timeout: Duration },

    /// A background worker panicked
    #[error("{0} panicked")]
    WorkerPanicked(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    pub fn name_collision(name: impl Into<String>) -> Self {
        LoggerError::NameCollision { name: name.into() }
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        LoggerError::NotFound { name: name.into() }
    }

    pub fn configuration_locked(name: impl Into<String>, setting: impl Into<String>) -> Self {
        LoggerError::ConfigurationLocked {
            name: name.into(),
            setting: setting.into(),
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    pub fn sink(sink: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::SinkError {
            sink: sink.into(),
            message: message.into(),
        }
    }

    pub fn shutdown_timeout(worker: impl Into<String>, timeout: Duration) -> Self {
        LoggerError::ShutdownTimeout {
            worker: worker.into(),
            timeout,
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Registry errors are programming errors the caller is expected to avoid
    pub fn is_registry_error(&self) -> bool {
        matches!(
            self,
            LoggerError::NameCollision { .. } | LoggerError::NotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::name_collision("net");
        assert!(matches!(err, LoggerError::NameCollision { .. }));
        assert!(err.is_registry_error());

        let err = LoggerError::not_found("net");
        assert!(matches!(err, LoggerError::NotFound { .. }));
        assert!(err.is_registry_error());

        let err = LoggerError::sink("file", "closed");
        assert!(!err.is_registry_error());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            LoggerError::name_collision("net").to_string(),
            "log name already present [net]"
        );
        assert_eq!(
            LoggerError::not_found("db").to_string(),
            "log not present [db]"
        );
        assert_eq!(
            LoggerError::configuration_locked("db", "default sink type").to_string(),
            "configuration of log [db] is locked: cannot change default sink type after the log is active"
        );
        assert_eq!(
            LoggerError::shutdown_timeout("performance worker", Duration::from_millis(20))
                .to_string(),
            "performance worker did not stop within 20ms"
        );
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("writing log file", "cannot write to file", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("writing log file"));
        assert!(err.to_string().contains("cannot write to file"));
    }
}
