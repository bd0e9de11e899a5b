//! Appender implementations

pub mod console;
pub mod rotating_file;
pub mod strategy;
pub mod time_rotating_file;

pub use console::ConsoleAppender;
pub use rotating_file::{RotatingFileAppender, SizeRotationPolicy, DEFAULT_MAX_SIZE_MB};
pub use strategy::RotationStrategy;
pub use time_rotating_file::{TimeRotatingFileAppender, TimeUnit};

pub use crate::core::Appender;
