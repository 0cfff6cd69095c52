//! # Scheduler Errors
//!
//! Defines [`SchedulerError`], covering everything the scheduler itself can
//! detect: registration identity conflicts, dependency graphs that cannot make
//! progress, lifecycle calls made out of order and worker pool start-up
//! failures. Errors raised inside a component's own callbacks are not
//! represented here; those belong to the component.
use thiserror::Error;

use crate::components::scheduler::Phase;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Component '{name}' has the same type as already registered component '{existing}'")]
    DuplicateComponent { name: &'static str, existing: &'static str },

    #[error("Dependency cycle detected: {}\n{dump}", .path.join(" -> "))]
    DependencyCycle { path: Vec<&'static str>, dump: String },

    #[error("No component is eligible to initialize, still pending: {pending:?}\n{dump}")]
    NoEligibleComponent { pending: Vec<&'static str>, dump: String },

    #[error("Cannot {operation} while scheduler is in phase {phase:?}")]
    InvalidPhase { operation: &'static str, phase: Phase },

    #[error("Component '{name}' panicked while initializing: {message}")]
    InitializationPanicked { name: &'static str, message: String },

    #[error("Initialization finished with components still pending: {remaining:?}")]
    IncompleteInitialization { remaining: Vec<&'static str> },

    #[error("Failed to spawn worker thread: {source}")]
    WorkerPool {
        #[source]
        source: std::io::Error,
    },
}

/// Shorthand for Result with [`SchedulerError`]
pub type Result<T> = std::result::Result<T, SchedulerError>;
