//! Logging macros.
//!
//! The macros check the level before building the argument list, so a
//! filtered call boxes nothing. Arguments are substituted into the `[]`
//! markers of the template and must be owned (`'static`) values, since they
//! may be formatted later on the performance-mode worker.
//!
//! # Examples
//!
//! ```
//! use rust_unit_logging::prelude::*;
//! use rust_unit_logging::{li, le};
//!
//! let registry = Registry::builder().default_sink("null").build();
//! let log = registry.logger("server").unwrap();
//!
//! // Basic logging
//! li!(log, "Server started");
//!
//! // With arguments
//! let port = 8080;
//! li!(log, "Server listening on port []", port);
//!
//! // Extra arguments are appended
//! le!(log, "request failed", 500, "Internal error".to_string());
//! ```

/// Log at the given level.
///
/// # Examples
///
/// ```
/// # use rust_unit_logging::prelude::*;
/// # let registry = Registry::builder().default_sink("null").build();
/// # let log = registry.logger("m").unwrap();
/// use rust_unit_logging::log;
/// log!(log, LogLevel::Info, "Simple message");
/// log!(log, LogLevel::Error, "Error code: []", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $template:expr $(, $arg:expr)* $(,)?) => {{
        let logger = &$logger;
        let level = $level;
        if $crate::core::adapters::LogCalls::is_enabled(logger, level) {
            $crate::core::adapters::LogCalls::log(
                logger,
                level,
                $template,
                vec![$($crate::core::format::arg($arg)),*],
            );
        }
    }};
}

/// Log at ERROR.
///
/// # Examples
///
/// ```
/// # use rust_unit_logging::prelude::*;
/// # let registry = Registry::builder().default_sink("null").build();
/// # let log = registry.logger("m").unwrap();
/// use rust_unit_logging::le;
/// le!(log, "Failed to connect to database");
/// le!(log, "Error code: [], message: []", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! le {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($rest)+)
    };
}

/// Log at WARN.
#[macro_export]
macro_rules! lw {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($rest)+)
    };
}

/// Log at INFO.
///
/// # Examples
///
/// ```
/// # use rust_unit_logging::prelude::*;
/// # let registry = Registry::builder().default_sink("null").build();
/// # let log = registry.logger("m").unwrap();
/// use rust_unit_logging::li;
/// li!(log, "Application started");
/// li!(log, "Processing [] items", 100);
/// ```
#[macro_export]
macro_rules! li {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($rest)+)
    };
}

/// Log at TRACE.
#[macro_export]
macro_rules! lf {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($rest)+)
    };
}
