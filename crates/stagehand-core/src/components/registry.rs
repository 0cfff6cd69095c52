use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::components::component::{Component, ComponentId, ComponentState};
use crate::components::error::{Result, SchedulerError};

/// Everything the scheduler tracks about one registered component.
pub(crate) struct ComponentEntry {
    pub(crate) component: Arc<dyn Component>,
    // Same allocation as `component`, kept for typed lookups
    instance: Arc<dyn Any + Send + Sync>,
    pub(crate) type_id: TypeId,
    pub(crate) name: &'static str,
    pub(crate) requires_main_thread: bool,
    pub(crate) state: ComponentState,
    /// Components that must be initialized before this one
    pub(crate) dependencies: Vec<ComponentId>,
    /// Inverse of `dependencies`, maintained alongside it
    pub(crate) depended_on_by: Vec<ComponentId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Index-based component arena.
///
/// Components are addressed by [`ComponentId`] (their slot index) so both
/// edge directions are plain adjacency lists with no ownership between
/// entries. Slots are emptied, not shifted, on removal, which keeps handles
/// stable for the lifetime of a run.
#[derive(Default)]
pub(crate) struct ComponentRegistry {
    slots: Vec<Option<ComponentEntry>>,
    by_type: HashMap<TypeId, ComponentId>,
}

impl ComponentRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a component, keyed by its concrete type. Two components of the
    /// same type can never coexist.
    pub(crate) fn register<C: Component>(&mut self, component: Arc<C>) -> Result<ComponentId> {
        let type_id = TypeId::of::<C>();
        let name = component.name();
        if let Some(existing) = self.by_type.get(&type_id).and_then(|id| self.get(*id)) {
            return Err(SchedulerError::DuplicateComponent {
                name,
                existing: existing.name,
            });
        }

        let id = ComponentId::new(self.slots.len());
        let requires_main_thread = component.requires_main_thread();
        let instance: Arc<dyn Any + Send + Sync> = component.clone();
        self.slots.push(Some(ComponentEntry {
            component,
            instance,
            type_id,
            name,
            requires_main_thread,
            state: ComponentState::Unregistered,
            dependencies: Vec::new(),
            depended_on_by: Vec::new(),
        }));
        self.by_type.insert(type_id, id);
        Ok(id)
    }

    pub(crate) fn get(&self, id: ComponentId) -> Option<&ComponentEntry> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: ComponentId) -> Option<&mut ComponentEntry> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Finds the component registered under concrete type `T`.
    pub(crate) fn lookup<T: Component>(&self) -> Option<(ComponentId, Arc<T>)> {
        let id = *self.by_type.get(&TypeId::of::<T>())?;
        let entry = self.get(id)?;
        Arc::clone(&entry.instance)
            .downcast::<T>()
            .ok()
            .map(|component| (id, component))
    }

    /// Live component handles, in registration order.
    pub(crate) fn ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| ComponentId::new(index))
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records "`dependent` needs `dependency`" in both directions.
    ///
    /// Returns false if either handle is unknown. Repeated edges are ignored.
    pub(crate) fn add_dependency(&mut self, dependent: ComponentId, dependency: ComponentId) -> bool {
        if self.get(dependency).is_none() {
            return false;
        }
        let Some(entry) = self.get_mut(dependent) else {
            return false;
        };
        if entry.dependencies.contains(&dependency) {
            return true;
        }
        entry.dependencies.push(dependency);
        if let Some(target) = self.get_mut(dependency) {
            target.depended_on_by.push(dependent);
        }
        true
    }

    pub(crate) fn remove(&mut self, id: ComponentId) -> Option<ComponentEntry> {
        let entry = self.slots.get_mut(id.index())?.take()?;
        self.by_type.remove(&entry.type_id);
        Some(entry)
    }

    /// Clear all instances.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.by_type.clear();
    }

    pub(crate) fn name_of(&self, id: ComponentId) -> &'static str {
        self.get(id).map_or("<unknown>", |entry| entry.name)
    }

    pub(crate) fn names<I>(&self, ids: I) -> Vec<&'static str>
    where
        I: IntoIterator<Item = ComponentId>,
    {
        ids.into_iter().map(|id| self.name_of(id)).collect()
    }

    /// Returns one dependency cycle, as a path that starts and ends on the same
    /// component, or `None` if the declared graph is acyclic.
    pub(crate) fn find_cycle(&self) -> Option<Vec<ComponentId>> {
        let mut marks = vec![Mark::Unvisited; self.slots.len()];
        let mut stack = Vec::new();

        for id in self.ids() {
            if marks[id.index()] == Mark::Unvisited {
                if let Some(cycle) = self.cycle_dfs(id, &mut marks, &mut stack) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn cycle_dfs(
        &self,
        id: ComponentId,
        marks: &mut [Mark],
        stack: &mut Vec<ComponentId>,
    ) -> Option<Vec<ComponentId>> {
        marks[id.index()] = Mark::OnStack;
        stack.push(id);

        if let Some(entry) = self.get(id) {
            for &dependency in &entry.dependencies {
                match marks[dependency.index()] {
                    Mark::Unvisited => {
                        if let Some(cycle) = self.cycle_dfs(dependency, marks, stack) {
                            return Some(cycle);
                        }
                    }
                    Mark::OnStack => {
                        let start = stack.iter().position(|&on_stack| on_stack == dependency).unwrap_or(0);
                        let mut cycle = stack[start..].to_vec();
                        cycle.push(dependency);
                        return Some(cycle);
                    }
                    Mark::Done => {}
                }
            }
        }

        stack.pop();
        marks[id.index()] = Mark::Done;
        None
    }

    /// Human-readable listing of every component, its thread affinity, state
    /// and declared dependencies.
    pub(crate) fn dependency_dump(&self) -> String {
        let mut out = format!("Components ({}):\n", self.len());
        for id in self.ids() {
            let Some(entry) = self.get(id) else { continue };
            let affinity = if entry.requires_main_thread { "main thread" } else { "any thread" };
            let _ = writeln!(out, "  {} {} [{}] ({})", id, entry.name, affinity, entry.state);
            if entry.dependencies.is_empty() {
                out.push_str("      depends on: (none)\n");
            } else {
                let deps = self.names(entry.dependencies.iter().copied());
                let _ = writeln!(out, "      depends on: {}", deps.join(", "));
            }
        }
        out
    }
}
