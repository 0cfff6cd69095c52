//! # Stagehand Components
//!
//! The component lifecycle scheduler.
//!
//! ## Key pieces
//!
//! - [`Component`](component::Component): the trait every scheduled unit
//!   implements, with its [`ComponentState`](component::ComponentState) and
//!   [`ComponentId`](component::ComponentId) handle.
//! - [`Dependencies`](dependencies::Dependencies): what a component sees while
//!   declaring what it needs.
//! - `selector`: greedy choice of the next eligible component (most pending
//!   dependents first, registration order on ties), honouring main-thread
//!   pinning.
//! - [`ExecutionQueue`](queue::ExecutionQueue): runs initialization tasks
//!   inline ([`SerialQueue`](queue::SerialQueue)) or on a worker pool
//!   ([`ConcurrentQueue`](queue::ConcurrentQueue)).
//! - [`Components`](scheduler::Components): the registry and driver API,
//!   `register` → `launch_initialization` → `wait_initialization_complete` →
//!   `cleanup_components`.
//! - [`FrameClock`](time::FrameClock): fixed-step and per-frame update
//!   dispatch once everything is ready.
pub mod component;
pub mod dependencies;
pub mod error;
pub mod queue;
pub(crate) mod registry;
pub mod scheduler;
pub mod selector;
pub mod time;

pub use component::{Component, ComponentId, ComponentState};
pub use dependencies::Dependencies;
pub use error::SchedulerError;
pub use queue::{ConcurrentQueue, ExecutionQueue, SerialQueue};
pub use scheduler::{Components, Phase};
pub use selector::ThreadContext;
pub use time::{FrameClock, TimeContext};

// Test module declaration
#[cfg(test)]
mod tests;
