use std::any::Any;
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use parking_lot::{Condvar, Mutex};

use crate::components::component::{Component, ComponentId, ComponentState};
use crate::components::dependencies::Dependencies;
use crate::components::error::{Result, SchedulerError};
use crate::components::queue::{default_worker_count, ConcurrentQueue, ExecutionQueue, SerialQueue};
use crate::components::registry::ComponentRegistry;
use crate::components::selector::{self, ThreadContext};
use crate::components::time::{TimeContext, UpdateRegistry};
use crate::config::ThreadingConfig;

/// Where the scheduler is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting registrations; nothing launched yet
    Registering,
    /// Launched, waiting for `wait_initialization_complete`
    Initializing,
    /// Every component post-initialized
    Ready,
    /// Launch or drain returned an error; only cleanup is possible
    Failed,
}

/// Everything guarded by the scheduler mutex.
pub(crate) struct SchedulerState {
    pub(crate) registry: ComponentRegistry,
    /// Not yet initialized, iterated in registration order
    pub(crate) pending: BTreeSet<ComponentId>,
    /// Claimed by a thread and currently inside `initialize`
    pub(crate) processing: BTreeSet<ComponentId>,
    pub(crate) completion_order: Vec<ComponentId>,
    pub(crate) updates: UpdateRegistry,
    pub(crate) parallel: bool,
    pub(crate) aborted: bool,
    /// Components whose initialize callback panicked, with the panic message
    pub(crate) failures: Vec<(ComponentId, String)>,
    pub(crate) phase: Phase,
}

impl SchedulerState {
    pub(crate) fn new() -> Self {
        Self {
            registry: ComponentRegistry::new(),
            pending: BTreeSet::new(),
            processing: BTreeSet::new(),
            completion_order: Vec::new(),
            updates: UpdateRegistry::default(),
            parallel: false,
            aborted: false,
            failures: Vec::new(),
            phase: Phase::Registering,
        }
    }
}

pub(crate) struct Shared {
    pub(crate) state: Mutex<SchedulerState>,
    /// Broadcast on every completed initialization
    pub(crate) ready: Condvar,
}

fn thread_label() -> String {
    thread::current().name().unwrap_or("<unnamed>").to_string()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

/// Runs one claimed component's initialize callback outside the lock, then
/// records its completion and wakes every waiting selector.
///
/// A panicking callback aborts the run: the component is released from
/// `processing`, recorded in `failures`, and every selector stops handing
/// out work.
pub(crate) fn initialize_component(shared: &Shared, id: ComponentId) {
    let component = {
        let mut state = shared.state.lock();
        match state.registry.get(id) {
            Some(entry) => Arc::clone(&entry.component),
            None => {
                log::error!("Component {} vanished from the registry before initializing", id);
                state.processing.remove(&id);
                drop(state);
                shared.ready.notify_all();
                return;
            }
        }
    };

    log::debug!("Initializing component '{}' on {}", component.name(), thread_label());
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| component.initialize())) {
        let message = panic_message(payload.as_ref());
        log::error!(
            "Component '{}' panicked while initializing on {}: {}",
            component.name(),
            thread_label(),
            message
        );
        {
            let mut state = shared.state.lock();
            state.processing.remove(&id);
            state.failures.push((id, message));
            state.aborted = true;
        }
        shared.ready.notify_all();
        return;
    }

    let listeners: Vec<Arc<dyn Component>> = {
        let mut state = shared.state.lock();
        if let Some(entry) = state.registry.get_mut(id) {
            entry.state = ComponentState::Initialized;
        }
        state.processing.remove(&id);
        state.pending.remove(&id);
        state.completion_order.push(id);
        state
            .pending
            .iter()
            .filter_map(|&other| state.registry.get(other))
            .map(|entry| Arc::clone(&entry.component))
            .collect()
    };
    log::debug!("Component '{}' initialized", component.name());

    for listener in &listeners {
        listener.component_initialized(component.as_ref());
    }
    shared.ready.notify_all();
}

fn worker_task(shared: &Shared) {
    match selector::select_next(shared, ThreadContext::Worker) {
        Ok(Some(id)) => initialize_component(shared, id),
        Ok(None) => log::trace!("Worker {} found nothing left to initialize", thread_label()),
        Err(err) => log::error!("Worker {} stopped: {}", thread_label(), err),
    }
}

/// The component lifecycle scheduler.
///
/// Register every component, then call [`launch_initialization`](Self::launch_initialization)
/// followed by [`wait_initialization_complete`](Self::wait_initialization_complete)
/// from the thread that main-thread pinned components must run on. Shut down
/// with [`cleanup_components`](Self::cleanup_components).
///
/// Launching takes `&mut self`, so no component can hold a handle to the
/// scheduler while its `declare_dependencies` runs under the scheduler lock.
/// Sibling lookups during declaration go through [`Dependencies`] instead.
pub struct Components {
    shared: Arc<Shared>,
    queue: Option<Box<dyn ExecutionQueue>>,
    worker_threads: usize,
}

impl Components {
    /// Scheduler with the default worker pool size.
    pub fn new() -> Self {
        Self::with_worker_threads(default_worker_count())
    }

    /// Scheduler whose parallel runs use `worker_threads` pool threads.
    pub fn with_worker_threads(worker_threads: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SchedulerState::new()),
                ready: Condvar::new(),
            }),
            queue: None,
            worker_threads: worker_threads.max(1),
        }
    }

    pub fn from_config(config: &ThreadingConfig) -> Self {
        Self::with_worker_threads(config.worker_count())
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// Registers a component. Fails if a component of the same concrete type
    /// is already registered or the run has already been launched.
    pub fn register<C: Component>(&self, component: Arc<C>) -> Result<ComponentId> {
        let mut state = self.shared.state.lock();
        if state.phase != Phase::Registering {
            return Err(SchedulerError::InvalidPhase {
                operation: "register a component",
                phase: state.phase,
            });
        }
        match state.registry.register(component) {
            Ok(id) => {
                log::debug!("Registered component '{}' as {}", state.registry.name_of(id), id);
                Ok(id)
            }
            Err(err) => {
                log::error!("{}", err);
                Err(err)
            }
        }
    }

    /// Gets the registered component of concrete type `T`.
    pub fn get<T: Component>(&self) -> Option<Arc<T>> {
        let state = self.shared.state.lock();
        state.registry.lookup::<T>().map(|(_, component)| component)
    }

    /// Declares dependencies, validates the graph and starts initializing.
    ///
    /// Worker-eligible components are handed to the pool right away in
    /// parallel mode. Main-thread pinned components (every component, in
    /// serial mode) wait for [`wait_initialization_complete`](Self::wait_initialization_complete).
    pub fn launch_initialization(&mut self, parallel: bool) -> Result<()> {
        let (queue, worker_tasks) = {
            let mut guard = self.shared.state.lock();
            let state = &mut *guard;
            if state.phase != Phase::Registering {
                return Err(SchedulerError::InvalidPhase {
                    operation: "launch initialization",
                    phase: state.phase,
                });
            }
            log::info!(
                "Launching {} initialization of {} components",
                if parallel { "parallel" } else { "serial" },
                state.registry.len()
            );
            state.parallel = parallel;
            state.aborted = false;
            state.failures.clear();

            let ids: Vec<ComponentId> = state.registry.ids().collect();
            for &id in &ids {
                let Some(entry) = state.registry.get_mut(id) else { continue };
                entry.state = ComponentState::DeclaringDependencies;
                let component = Arc::clone(&entry.component);
                let mut deps = Dependencies::new(id, &mut state.registry, &mut state.updates);
                component.declare_dependencies(&mut deps);
                if let Some(entry) = state.registry.get_mut(id) {
                    entry.state = ComponentState::DependenciesDeclared;
                }
            }

            if let Some(cycle) = state.registry.find_cycle() {
                let path = state.registry.names(cycle);
                let dump = state.registry.dependency_dump();
                log::error!("Dependency cycle detected: {}\n{}", path.join(" -> "), dump);
                state.phase = Phase::Failed;
                return Err(SchedulerError::DependencyCycle { path, dump });
            }

            let mut main_thread = 0;
            let mut worker = 0;
            state.pending.clear();
            state.processing.clear();
            state.completion_order.clear();
            for &id in &ids {
                let Some(entry) = state.registry.get_mut(id) else { continue };
                entry.state = ComponentState::WaitingToInitialize;
                if !parallel || entry.requires_main_thread {
                    main_thread += 1;
                } else {
                    worker += 1;
                }
                state.pending.insert(id);
            }
            log::info!(
                "{} components run on the main thread, {} on workers",
                main_thread,
                worker
            );
            log::debug!("{}", state.registry.dependency_dump());

            let queue: Box<dyn ExecutionQueue> = if parallel && worker > 0 {
                match ConcurrentQueue::new(self.worker_threads) {
                    Ok(queue) => Box::new(queue),
                    Err(err) => {
                        state.phase = Phase::Failed;
                        return Err(err);
                    }
                }
            } else {
                Box::new(SerialQueue)
            };
            state.phase = Phase::Initializing;
            (queue, worker)
        };

        for _ in 0..worker_tasks {
            let shared = Arc::clone(&self.shared);
            queue.enqueue(Box::new(move || worker_task(&shared)));
        }
        self.queue = Some(queue);
        Ok(())
    }

    /// Initializes whatever is left on the calling thread, waits for the pool
    /// to drain, then post-initializes every component in completion order.
    pub fn wait_initialization_complete(&mut self) -> Result<()> {
        {
            let state = self.shared.state.lock();
            if state.phase != Phase::Initializing {
                return Err(SchedulerError::InvalidPhase {
                    operation: "wait for initialization",
                    phase: state.phase,
                });
            }
        }

        log::info!("Initializing main-thread components");
        if let Err(err) = self.drain_main_thread() {
            self.abort_run();
            return Err(err);
        }
        if let Some(queue) = self.queue.take() {
            queue.wait();
        }

        let order = {
            let mut state = self.shared.state.lock();
            if let Some((id, message)) = state.failures.first().cloned() {
                state.phase = Phase::Failed;
                return Err(SchedulerError::InitializationPanicked {
                    name: state.registry.name_of(id),
                    message,
                });
            }
            if !state.pending.is_empty() {
                let remaining = state.registry.names(state.pending.iter().copied());
                log::error!("Initialization finished with pending components: {:?}", remaining);
                state.phase = Phase::Failed;
                return Err(SchedulerError::IncompleteInitialization { remaining });
            }
            state.completion_order.clone()
        };

        log::info!("Post-initializing {} components", order.len());
        for id in order {
            let component = {
                let mut state = self.shared.state.lock();
                let Some(entry) = state.registry.get_mut(id) else { continue };
                entry.state = ComponentState::PostInitializing;
                Arc::clone(&entry.component)
            };
            log::debug!("Post-initializing component '{}'", component.name());
            component.post_initialize();
            if let Some(entry) = self.shared.state.lock().registry.get_mut(id) {
                entry.state = ComponentState::Ready;
            }
        }

        self.shared.state.lock().phase = Phase::Ready;
        log::info!("Component initialization complete");
        Ok(())
    }

    fn drain_main_thread(&self) -> Result<()> {
        while let Some(id) = selector::select_next(&self.shared, ThreadContext::Main)? {
            initialize_component(&self.shared, id);
        }
        Ok(())
    }

    // Releases blocked workers and joins the pool
    fn abort_run(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.aborted = true;
            state.phase = Phase::Failed;
        }
        self.shared.ready.notify_all();
        if let Some(queue) = self.queue.take() {
            queue.wait();
        }
    }

    /// True once a launched run has no component left pending.
    pub fn is_initialization_complete(&self) -> bool {
        let state = self.shared.state.lock();
        matches!(state.phase, Phase::Initializing | Phase::Ready) && state.pending.is_empty()
    }

    /// Deinitializes every initialized component in reverse completion order,
    /// then empties the registry so a new run can start.
    ///
    /// Best effort: bookkeeping mismatches are logged and skipped, never
    /// returned.
    pub fn cleanup_components(&mut self) {
        if self.queue.is_some() {
            log::warn!("Cleaning up while initialization is still in progress, abandoning it");
            self.abort_run();
        }

        let order = self.shared.state.lock().completion_order.clone();
        log::info!("Deinitializing {} components", order.len());

        for &id in order.iter().rev() {
            let component = {
                let mut state = self.shared.state.lock();
                match state.registry.get_mut(id) {
                    Some(entry) => {
                        entry.state = ComponentState::Deinitializing;
                        Arc::clone(&entry.component)
                    }
                    None => {
                        log::error!("Component {} not found in the registry during deinitialize", id);
                        continue;
                    }
                }
            };
            log::debug!("Deinitializing component '{}'", component.name());
            component.deinitialize();

            let mut state = self.shared.state.lock();
            if let Some(entry) = state.registry.get_mut(id) {
                entry.state = ComponentState::Deinitialized;
            }
            state.updates.remove(id);
            if state.registry.remove(id).is_none() {
                log::error!("Component '{}' was removed from the registry while deinitializing", component.name());
            }
        }

        let mut state = self.shared.state.lock();
        if !state.registry.is_empty() {
            let leftover = state.registry.names(state.registry.ids());
            log::error!(
                "{} components still registered after deinitializing, clearing: {:?}",
                leftover.len(),
                leftover
            );
        }
        state.registry.clear();
        state.pending.clear();
        state.processing.clear();
        state.completion_order.clear();
        state.updates.clear();
        state.parallel = false;
        state.aborted = false;
        state.failures.clear();
        state.phase = Phase::Registering;
        log::info!("Component cleanup complete");
    }

    /// Dispatches a fixed-step update to every opted-in component, in
    /// completion order. Skipped until initialization is complete.
    pub fn update_fixed_step(&self, time: &TimeContext) {
        for component in self.updatables(|updates, id| updates.is_fixed_step(id)) {
            component.update_fixed_step(time);
        }
    }

    /// Dispatches a once-per-frame update, see [`update_fixed_step`](Self::update_fixed_step).
    pub fn update_once_per_frame(&self, time: &TimeContext) {
        for component in self.updatables(|updates, id| updates.is_once_per_frame(id)) {
            component.update_once_per_frame(time);
        }
    }

    fn updatables<F>(&self, wants: F) -> Vec<Arc<dyn Component>>
    where
        F: Fn(&UpdateRegistry, ComponentId) -> bool,
    {
        let state = self.shared.state.lock();
        if state.phase != Phase::Ready {
            log::trace!("Skipping update dispatch in phase {:?}", state.phase);
            return Vec::new();
        }
        state
            .completion_order
            .iter()
            .filter(|&&id| wants(&state.updates, id))
            .filter_map(|&id| state.registry.get(id))
            .map(|entry| Arc::clone(&entry.component))
            .collect()
    }

    pub fn phase(&self) -> Phase {
        self.shared.state.lock().phase
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn state_of(&self, id: ComponentId) -> Option<ComponentState> {
        self.shared.state.lock().registry.get(id).map(|entry| entry.state)
    }

    pub fn name_of(&self, id: ComponentId) -> Option<&'static str> {
        self.shared.state.lock().registry.get(id).map(|entry| entry.name)
    }

    /// Declared dependencies of `id`.
    pub fn dependencies_of(&self, id: ComponentId) -> Vec<ComponentId> {
        let state = self.shared.state.lock();
        state
            .registry
            .get(id)
            .map(|entry| entry.dependencies.clone())
            .unwrap_or_default()
    }

    /// Components that declared a dependency on `id`.
    pub fn dependents_of(&self, id: ComponentId) -> Vec<ComponentId> {
        let state = self.shared.state.lock();
        state
            .registry
            .get(id)
            .map(|entry| entry.depended_on_by.clone())
            .unwrap_or_default()
    }

    /// Order in which components finished initializing in the current run.
    pub fn completion_order(&self) -> Vec<ComponentId> {
        self.shared.state.lock().completion_order.clone()
    }

    pub fn completion_order_names(&self) -> Vec<&'static str> {
        let state = self.shared.state.lock();
        state.registry.names(state.completion_order.iter().copied())
    }

    /// Every component with its affinity, state and declared dependencies.
    pub fn dependency_dump(&self) -> String {
        self.shared.state.lock().registry.dependency_dump()
    }
}

impl Default for Components {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Components {
    fn drop(&mut self) {
        if self.queue.is_some() {
            self.abort_run();
        }
    }
}
