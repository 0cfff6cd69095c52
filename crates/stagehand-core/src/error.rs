//! # Stagehand Core Errors
//!
//! Crate-level error type. Each subsystem owns its own typed error
//! ([`SchedulerError`], [`ConfigError`]); this enum wraps them so a host can
//! propagate either with a single `?`.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::components::error::SchedulerError;
use crate::config::error::ConfigError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Scheduling-level failure (registration conflict, cycle, misuse of the lifecycle API)
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;
