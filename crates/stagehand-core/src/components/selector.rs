//! Picks the next component to initialize.
//!
//! Among pending components whose dependencies are all initialized and whose
//! thread affinity suits the caller, the one with the most pending transitive
//! dependents wins. Ties go to the earliest registered component, since the
//! pending set iterates in registration order.
use std::collections::HashSet;

use crate::components::component::{ComponentId, ComponentState};
use crate::components::error::{Result, SchedulerError};
use crate::components::registry::{ComponentEntry, ComponentRegistry};
use crate::components::scheduler::{SchedulerState, Shared};

/// Which kind of thread is asking for work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadContext {
    /// The thread driving `wait_initialization_complete`; may run anything.
    Main,
    /// A pool thread; may only run components that are not main-thread pinned.
    Worker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Selection {
    Selected(ComponentId),
    /// Nothing left that this caller could ever run
    Exhausted,
    /// Work remains for this caller but none of it is eligible yet
    Blocked,
}

fn dependencies_initialized(registry: &ComponentRegistry, entry: &ComponentEntry) -> bool {
    entry.dependencies.iter().all(|&dependency| {
        registry
            .get(dependency)
            .is_some_and(|dep| dep.state.is_initialized())
    })
}

/// Number of distinct pending components reachable from `id` through
/// `depended_on_by`.
pub(crate) fn pending_dependents(state: &SchedulerState, id: ComponentId) -> usize {
    let mut visited = HashSet::new();
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        let Some(entry) = state.registry.get(current) else { continue };
        for &dependent in &entry.depended_on_by {
            if state.pending.contains(&dependent) && visited.insert(dependent) {
                stack.push(dependent);
            }
        }
    }
    visited.len()
}

/// Chooses without side effects.
pub(crate) fn pick(state: &SchedulerState, context: ThreadContext) -> Selection {
    let mut any_compatible = false;
    // (id, priority)
    let mut best: Option<(ComponentId, usize)> = None;

    for &id in &state.pending {
        let Some(entry) = state.registry.get(id) else { continue };
        if entry.state != ComponentState::WaitingToInitialize {
            continue;
        }
        let compatible = match context {
            ThreadContext::Main => true,
            // Serial runs treat every component as main-thread pinned
            ThreadContext::Worker => state.parallel && !entry.requires_main_thread,
        };
        if !compatible {
            continue;
        }
        any_compatible = true;
        if !dependencies_initialized(&state.registry, entry) {
            continue;
        }

        let priority = pending_dependents(state, id);
        // Strictly greater, so the earliest registered wins a tie
        if best.is_none_or(|(_, best_priority)| priority > best_priority) {
            best = Some((id, priority));
        }
    }

    match best {
        Some((id, _)) => Selection::Selected(id),
        None if any_compatible => Selection::Blocked,
        None => Selection::Exhausted,
    }
}

/// Claims the next component for the calling thread, marking it
/// `Initializing` before the lock is released.
///
/// Returns `Ok(None)` once nothing is left for this caller. In parallel mode a
/// blocked caller sleeps until the next completion; in serial mode (or when
/// the main thread is blocked with nothing in flight) no progress is possible
/// and the stuck graph is reported instead.
pub(crate) fn select_next(shared: &Shared, context: ThreadContext) -> Result<Option<ComponentId>> {
    let mut state = shared.state.lock();
    loop {
        if state.aborted {
            return Ok(None);
        }
        match pick(&state, context) {
            Selection::Selected(id) => {
                if let Some(entry) = state.registry.get_mut(id) {
                    entry.state = ComponentState::Initializing;
                }
                state.processing.insert(id);
                log::trace!(
                    "Selected '{}' for {:?} thread",
                    state.registry.name_of(id),
                    context
                );
                return Ok(Some(id));
            }
            Selection::Exhausted => return Ok(None),
            Selection::Blocked => {
                let stuck = !state.parallel
                    || (context == ThreadContext::Main && state.processing.is_empty());
                if stuck {
                    let pending = state.registry.names(state.pending.iter().copied());
                    let dump = state.registry.dependency_dump();
                    log::error!("No component can make progress, pending: {:?}\n{}", pending, dump);
                    return Err(SchedulerError::NoEligibleComponent { pending, dump });
                }
                shared.ready.wait(&mut state);
            }
        }
    }
}
