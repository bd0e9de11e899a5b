//! File rotation strategies
//!
//! Turns the rotation part of the configuration into a boxed appender for a
//! file path, so the logger builder doesn't care which division is in use.

use super::rotating_file::{RotatingFileAppender, SizeRotationPolicy};
use super::time_rotating_file::{TimeRotatingFileAppender, TimeUnit};
use crate::core::appender::Appender;
use crate::core::error::Result;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationStrategy {
    /// One file per time period
    Time { unit: TimeUnit, max_age_days: u32 },
    /// Numbered backups once the active file is full
    Size(SizeRotationPolicy),
}

impl Default for RotationStrategy {
    fn default() -> Self {
        RotationStrategy::Size(SizeRotationPolicy::default())
    }
}

impl RotationStrategy {
    /// Open a rotating file appender for `path`
    ///
    /// # Errors
    ///
    /// Returns error if the file or its directory cannot be created
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn Appender>> {
        match self {
            RotationStrategy::Time { unit, max_age_days } => Ok(Box::new(
                TimeRotatingFileAppender::new(path, *unit, *max_age_days)?,
            )),
            RotationStrategy::Size(policy) => Ok(Box::new(RotatingFileAppender::with_policy(
                path,
                policy.clone(),
            )?)),
        }
    }
}
