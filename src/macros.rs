//! Formatting macros
//!
//! Thin wrappers over the `*f` logger methods, formatting like `format!`.
//! The message is rendered at the call site before the level check.
//!
//! # Examples
//!
//! ```no_run
//! use teelog::prelude::*;
//! use teelog::infof;
//!
//! let logger = Logger::builder().build().unwrap();
//!
//! let port = 8080;
//! infof!(logger, "Server listening on port {}", port);
//! ```

/// Log a formatted message at the given level
///
/// ```no_run
/// # use teelog::prelude::*;
/// # let logger = Logger::builder().build().unwrap();
/// use teelog::logf;
/// logf!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! logf {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, ::std::format!($($arg)+), &[])
    };
}

/// Log a formatted debug-level message
#[macro_export]
macro_rules! debugf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debugf(::std::format_args!($($arg)+))
    };
}

/// Log a formatted info-level message
///
/// ```no_run
/// # use teelog::prelude::*;
/// # let logger = Logger::builder().build().unwrap();
/// use teelog::infof;
/// infof!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! infof {
    ($logger:expr, $($arg:tt)+) => {
        $logger.infof(::std::format_args!($($arg)+))
    };
}

/// Log a formatted warn-level message
#[macro_export]
macro_rules! warnf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.warnf(::std::format_args!($($arg)+))
    };
}

/// Log a formatted error-level message
///
/// ```no_run
/// # use teelog::prelude::*;
/// # let logger = Logger::builder().build().unwrap();
/// use teelog::errorf;
/// errorf!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! errorf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.errorf(::std::format_args!($($arg)+))
    };
}

/// Log a formatted fatal-level message, then run the logger's fatal hook
#[macro_export]
macro_rules! fatalf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.fatalf(::std::format_args!($($arg)+))
    };
}
