//! # Stagehand Core
//!
//! Dependency-ordered component lifecycle scheduling.
//!
//! The [`components`] module holds the scheduler itself: components declare
//! what they need, the scheduler initializes them in an order that respects
//! those declarations (on a worker pool where allowed, on the calling thread
//! where a component is pinned to it), runs post-initialization in completion
//! order and tears everything down in reverse. The [`config`] module loads the
//! threading options that pick between parallel and serial startup.
pub mod components;
pub mod config;
pub mod error;

// Re-export key public types/traits for easier use by the binary
pub use components::{
    Component, ComponentId, ComponentState, Components, Dependencies, FrameClock, TimeContext,
};
pub use config::{SchedulerConfig, ThreadingConfig};
pub use error::{Error, Result};

#[cfg(test)]
mod tests;
