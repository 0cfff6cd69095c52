use std::fmt;

use crate::components::dependencies::Dependencies;
use crate::components::time::TimeContext;

/// Lifecycle state of a registered component.
///
/// States only ever move forward in declaration order, so `Ord` doubles as
/// "has reached at least this state".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentState {
    Unregistered,
    DeclaringDependencies,
    DependenciesDeclared,
    WaitingToInitialize,
    Initializing,
    Initialized,
    PostInitializing,
    Ready,
    Deinitializing,
    Deinitialized,
}

impl ComponentState {
    /// True once the component has finished its initialize callback.
    pub fn is_initialized(self) -> bool {
        self >= ComponentState::Initialized
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComponentState::Unregistered => "unregistered",
            ComponentState::DeclaringDependencies => "declaring dependencies",
            ComponentState::DependenciesDeclared => "dependencies declared",
            ComponentState::WaitingToInitialize => "waiting to initialize",
            ComponentState::Initializing => "initializing",
            ComponentState::Initialized => "initialized",
            ComponentState::PostInitializing => "post-initializing",
            ComponentState::Ready => "ready",
            ComponentState::Deinitializing => "deinitializing",
            ComponentState::Deinitialized => "deinitialized",
        };
        f.write_str(s)
    }
}

/// Handle to a registered component: its slot in the scheduler's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(usize);

impl ComponentId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Registration index of the component.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Core lifecycle trait for everything the scheduler drives.
///
/// The scheduler never owns a component's behaviour, only a shared handle to
/// it. Every callback takes `&self`; a component that needs to mutate itself
/// during initialization uses interior mutability, since `initialize` may run
/// on any worker thread unless [`requires_main_thread`](Self::requires_main_thread)
/// says otherwise.
///
/// Each of `initialize`, `post_initialize` and `deinitialize` is called exactly
/// once per run.
pub trait Component: Send + Sync + 'static {
    /// Human-readable label, used for diagnostics only.
    fn name(&self) -> &'static str;

    /// Whether `initialize` must run on the thread that drives
    /// `wait_initialization_complete`. Queried once, before scheduling begins.
    fn requires_main_thread(&self) -> bool {
        false
    }

    /// Declares the components this one needs before it may initialize.
    ///
    /// Called once, single-threaded, in registration order. Must not call back
    /// into the scheduler; everything it needs is on `deps`.
    fn declare_dependencies(&self, _deps: &mut Dependencies<'_>) {}

    /// Called once all declared dependencies are initialized. Must not block on
    /// anything outside those dependencies.
    fn initialize(&self);

    /// Called after every component has initialized, in completion order.
    fn post_initialize(&self) {}

    /// Called during shutdown, in reverse completion order.
    fn deinitialize(&self) {}

    /// Called whenever another component finishes initializing while this one
    /// is still pending.
    fn component_initialized(&self, _other: &dyn Component) {}

    /// Fixed-step update. Only dispatched to components that registered for it
    /// via [`Dependencies::register_fixed_step_updatable`].
    fn update_fixed_step(&self, _time: &TimeContext) {}

    /// Once-per-frame update. Only dispatched to components that registered
    /// for it via [`Dependencies::register_once_per_frame_updatable`].
    fn update_once_per_frame(&self, _time: &TimeContext) {}
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name())
            .field("requires_main_thread", &self.requires_main_thread())
            .finish()
    }
}
