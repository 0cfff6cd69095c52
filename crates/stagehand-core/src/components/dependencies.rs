use std::any::type_name;
use std::sync::Arc;

use crate::components::component::{Component, ComponentId};
use crate::components::registry::ComponentRegistry;
use crate::components::time::UpdateRegistry;

/// Handed to [`Component::declare_dependencies`].
///
/// Every request made through it is recorded against the component currently
/// declaring. This is the only way a component reaches its siblings; there is
/// no global scheduler to look them up through.
pub struct Dependencies<'a> {
    current: ComponentId,
    registry: &'a mut ComponentRegistry,
    updates: &'a mut UpdateRegistry,
}

impl<'a> Dependencies<'a> {
    pub(crate) fn new(
        current: ComponentId,
        registry: &'a mut ComponentRegistry,
        updates: &'a mut UpdateRegistry,
    ) -> Self {
        Self {
            current,
            registry,
            updates,
        }
    }

    /// Handle of the component that is declaring.
    pub fn id(&self) -> ComponentId {
        self.current
    }

    /// Looks up the component of type `T` and records it as a dependency.
    ///
    /// Returns `None` (and records nothing) if no such component is registered.
    pub fn require<T: Component>(&mut self) -> Option<Arc<T>> {
        match self.registry.lookup::<T>() {
            Some((id, component)) => {
                self.registry.add_dependency(self.current, id);
                Some(component)
            }
            None => {
                log::warn!(
                    "Component '{}' requires '{}', which is not registered",
                    self.registry.name_of(self.current),
                    type_name::<T>()
                );
                None
            }
        }
    }

    /// Looks up the component of type `T` without recording a dependency.
    pub fn get<T: Component>(&self) -> Option<Arc<T>> {
        self.registry.lookup::<T>().map(|(_, component)| component)
    }

    /// Records a dependency by handle. Returns false if `id` is unknown.
    pub fn depends_on(&mut self, id: ComponentId) -> bool {
        let added = self.registry.add_dependency(self.current, id);
        if !added {
            log::warn!(
                "Component '{}' declared a dependency on unknown handle {}",
                self.registry.name_of(self.current),
                id
            );
        }
        added
    }

    /// Opts the declaring component into fixed-step updates.
    pub fn register_fixed_step_updatable(&mut self) {
        self.updates.add_fixed_step(self.current);
    }

    /// Opts the declaring component into once-per-frame updates.
    pub fn register_once_per_frame_updatable(&mut self) {
        self.updates.add_once_per_frame(self.current);
    }
}
