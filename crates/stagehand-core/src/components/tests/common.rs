use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::Mutex;

use crate::components::{Component, ComponentId, Dependencies, TimeContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Initialize(&'static str, ThreadId),
    PostInitialize(&'static str),
    Deinitialize(&'static str),
    Notified { listener: &'static str, other: &'static str },
    FixedStep(&'static str, u64),
    Frame(&'static str, u64),
}

/// Shared, thread-safe log of lifecycle callbacks.
#[derive(Debug, Default, Clone)]
pub(crate) struct Trace(Arc<Mutex<Vec<Event>>>);

impl Trace {
    pub(crate) fn record(&self, event: Event) {
        self.0.lock().push(event);
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.0.lock().clone()
    }

    pub(crate) fn initialized(&self) -> Vec<&'static str> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Initialize(name, _) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn post_initialized(&self) -> Vec<&'static str> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::PostInitialize(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn deinitialized(&self) -> Vec<&'static str> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Deinitialize(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn init_thread(&self, name: &str) -> Option<ThreadId> {
        self.events().into_iter().find_map(|event| match event {
            Event::Initialize(n, thread) if n == name => Some(thread),
            _ => None,
        })
    }

    pub(crate) fn count(&self, wanted: &Event) -> usize {
        self.0.lock().iter().filter(|event| *event == wanted).count()
    }
}

/// Configurable test component. The const parameter only exists to give each
/// probe in a test its own concrete type, since the registry rejects two
/// components of the same type.
pub(crate) struct Probe<const N: usize> {
    name: &'static str,
    main_thread: bool,
    fixed_step: bool,
    per_frame: bool,
    delay: Option<Duration>,
    panics: bool,
    depends_on: Mutex<Vec<ComponentId>>,
    trace: Trace,
}

impl<const N: usize> Probe<N> {
    pub(crate) fn new(name: &'static str, trace: &Trace) -> Self {
        Self {
            name,
            main_thread: false,
            fixed_step: false,
            per_frame: false,
            delay: None,
            panics: false,
            depends_on: Mutex::new(Vec::new()),
            trace: trace.clone(),
        }
    }

    pub(crate) fn pinned(mut self) -> Self {
        self.main_thread = true;
        self
    }

    pub(crate) fn updating(mut self) -> Self {
        self.fixed_step = true;
        self.per_frame = true;
        self
    }

    pub(crate) fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    pub(crate) fn depend_on(&self, id: ComponentId) {
        self.depends_on.lock().push(id);
    }
}

impl<const N: usize> Component for Probe<N> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn requires_main_thread(&self) -> bool {
        self.main_thread
    }

    fn declare_dependencies(&self, deps: &mut Dependencies<'_>) {
        for &id in self.depends_on.lock().iter() {
            deps.depends_on(id);
        }
        if self.fixed_step {
            deps.register_fixed_step_updatable();
        }
        if self.per_frame {
            deps.register_once_per_frame_updatable();
        }
    }

    fn initialize(&self) {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        if self.panics {
            panic!("{} failed to initialize", self.name);
        }
        self.trace.record(Event::Initialize(self.name, thread::current().id()));
    }

    fn post_initialize(&self) {
        self.trace.record(Event::PostInitialize(self.name));
    }

    fn deinitialize(&self) {
        self.trace.record(Event::Deinitialize(self.name));
    }

    fn component_initialized(&self, other: &dyn Component) {
        self.trace.record(Event::Notified {
            listener: self.name,
            other: other.name(),
        });
    }

    fn update_fixed_step(&self, time: &TimeContext) {
        self.trace.record(Event::FixedStep(self.name, time.frame_number));
    }

    fn update_once_per_frame(&self, time: &TimeContext) {
        self.trace.record(Event::Frame(self.name, time.frame_number));
    }
}
