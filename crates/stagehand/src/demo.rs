//! Demo components the host registers for each `--scenario`.
use std::sync::Arc;
use std::thread;

use clap::ValueEnum;
use stagehand_core::{Component, Components, Dependencies, Result, TimeContext};

/// Which demo dependency graph to register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// settings -> assets -> renderer
    Chain,
    /// device feeding textures and shaders, both feeding pipeline
    Diamond,
    /// window and input pinned to the main thread, audio and physics free
    Pinned,
    /// two components requiring each other
    Cycle,
}

fn announce(name: &str, step: &str) {
    log::info!(
        "{} '{}' on {}",
        step,
        name,
        thread::current().name().unwrap_or("<unnamed>")
    );
}

// Each demo component is its own type, since the scheduler keys components by
// concrete type. `requires` lists the types looked up during declare.
macro_rules! demo_component {
    ($ty:ident, $name:literal, pinned: $pinned:literal, requires: [$($dep:ident),*], updates: $updates:literal) => {
        #[derive(Debug)]
        pub struct $ty;

        impl Component for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn requires_main_thread(&self) -> bool {
                $pinned
            }

            fn declare_dependencies(&self, deps: &mut Dependencies<'_>) {
                $(deps.require::<$dep>();)*
                if $updates {
                    deps.register_fixed_step_updatable();
                    deps.register_once_per_frame_updatable();
                }
            }

            fn initialize(&self) {
                announce($name, "Initializing");
            }

            fn post_initialize(&self) {
                announce($name, "Post-initializing");
            }

            fn deinitialize(&self) {
                announce($name, "Deinitializing");
            }

            fn update_fixed_step(&self, time: &TimeContext) {
                log::trace!("'{}' fixed step at {:.4}s", $name, time.time);
            }

            fn update_once_per_frame(&self, time: &TimeContext) {
                log::debug!("'{}' frame {}", $name, time.frame_number);
            }
        }
    };
}

demo_component!(Settings, "settings", pinned: false, requires: [], updates: false);
demo_component!(Assets, "assets", pinned: false, requires: [Settings], updates: false);
demo_component!(Renderer, "renderer", pinned: false, requires: [Assets], updates: true);

demo_component!(Device, "device", pinned: false, requires: [], updates: false);
demo_component!(Textures, "textures", pinned: false, requires: [Device], updates: false);
demo_component!(Shaders, "shaders", pinned: false, requires: [Device], updates: false);
demo_component!(Pipeline, "pipeline", pinned: false, requires: [Textures, Shaders], updates: true);

demo_component!(Window, "window", pinned: true, requires: [], updates: false);
demo_component!(Input, "input", pinned: true, requires: [Window], updates: true);
demo_component!(Audio, "audio", pinned: false, requires: [], updates: false);
demo_component!(Physics, "physics", pinned: false, requires: [Audio], updates: true);

demo_component!(Alpha, "alpha", pinned: false, requires: [Beta], updates: false);
demo_component!(Beta, "beta", pinned: false, requires: [Alpha], updates: false);

/// Registers the scenario's components, in an order unrelated to their
/// dependencies.
pub fn register(components: &Components, scenario: Scenario) -> Result<()> {
    match scenario {
        Scenario::Chain => {
            components.register(Arc::new(Renderer))?;
            components.register(Arc::new(Settings))?;
            components.register(Arc::new(Assets))?;
        }
        Scenario::Diamond => {
            components.register(Arc::new(Pipeline))?;
            components.register(Arc::new(Shaders))?;
            components.register(Arc::new(Textures))?;
            components.register(Arc::new(Device))?;
        }
        Scenario::Pinned => {
            components.register(Arc::new(Physics))?;
            components.register(Arc::new(Input))?;
            components.register(Arc::new(Audio))?;
            components.register(Arc::new(Window))?;
        }
        Scenario::Cycle => {
            components.register(Arc::new(Alpha))?;
            components.register(Arc::new(Beta))?;
        }
    }
    Ok(())
}
