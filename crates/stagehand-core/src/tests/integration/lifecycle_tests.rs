//! End-to-end runs through the public API, with components that reach each
//! other by type.
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use crate::components::Phase;
use crate::{Component, ComponentState, Components, Dependencies, FrameClock, TimeContext};

#[derive(Default)]
struct Journal(Mutex<Vec<String>>);

impl Journal {
    fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

struct Window {
    journal: Arc<Journal>,
    thread: Mutex<Option<thread::ThreadId>>,
}

impl Component for Window {
    fn name(&self) -> &'static str {
        "window"
    }

    fn requires_main_thread(&self) -> bool {
        true
    }

    fn initialize(&self) {
        *self.thread.lock() = Some(thread::current().id());
        self.journal.push("init window");
    }

    fn deinitialize(&self) {
        self.journal.push("deinit window");
    }
}

struct Assets {
    journal: Arc<Journal>,
    loaded: AtomicBool,
}

impl Component for Assets {
    fn name(&self) -> &'static str {
        "assets"
    }

    fn initialize(&self) {
        thread::sleep(Duration::from_millis(5));
        self.loaded.store(true, Ordering::SeqCst);
        self.journal.push("init assets");
    }

    fn deinitialize(&self) {
        self.journal.push("deinit assets");
    }
}

struct Renderer {
    journal: Arc<Journal>,
    assets: Mutex<Option<Arc<Assets>>>,
    frames: AtomicU32,
}

impl Component for Renderer {
    fn name(&self) -> &'static str {
        "renderer"
    }

    fn declare_dependencies(&self, deps: &mut Dependencies<'_>) {
        deps.require::<Window>();
        *self.assets.lock() = deps.require::<Assets>();
        deps.register_once_per_frame_updatable();
    }

    fn initialize(&self) {
        let ready = self
            .assets
            .lock()
            .as_ref()
            .is_some_and(|assets| assets.loaded.load(Ordering::SeqCst));
        self.journal.push(format!("init renderer (assets loaded: {ready})"));
    }

    fn post_initialize(&self) {
        self.journal.push("post renderer");
    }

    fn deinitialize(&self) {
        self.journal.push("deinit renderer");
    }

    fn update_once_per_frame(&self, _time: &TimeContext) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }
}

struct Fixture {
    journal: Arc<Journal>,
    window: Arc<Window>,
    renderer: Arc<Renderer>,
}

fn register_all(components: &Components) -> Fixture {
    let journal = Arc::new(Journal::default());
    let renderer = Arc::new(Renderer {
        journal: Arc::clone(&journal),
        assets: Mutex::new(None),
        frames: AtomicU32::new(0),
    });
    let window = Arc::new(Window {
        journal: Arc::clone(&journal),
        thread: Mutex::new(None),
    });
    // Registration order does not have to follow the dependency order
    components.register(Arc::clone(&renderer)).unwrap();
    components.register(Arc::clone(&window)).unwrap();
    components
        .register(Arc::new(Assets {
            journal: Arc::clone(&journal),
            loaded: AtomicBool::new(false),
        }))
        .unwrap();
    Fixture {
        journal,
        window,
        renderer,
    }
}

fn full_run(parallel: bool) {
    let mut components = Components::with_worker_threads(2);
    let fixture = register_all(&components);

    components.launch_initialization(parallel).unwrap();
    components.wait_initialization_complete().unwrap();
    assert!(components.is_initialization_complete());
    assert_eq!(components.phase(), Phase::Ready);

    let order = components.completion_order_names();
    assert_eq!(order.len(), 3);
    assert_eq!(order.last(), Some(&"renderer"));
    assert_eq!(*fixture.window.thread.lock(), Some(thread::current().id()));
    for id in components.completion_order() {
        assert_eq!(components.state_of(id), Some(ComponentState::Ready));
    }

    let mut clock = FrameClock::default();
    for _ in 0..3 {
        clock.tick(&components, Duration::from_millis(16));
    }
    assert_eq!(fixture.renderer.frames.load(Ordering::SeqCst), 3);

    components.cleanup_components();
    assert!(components.is_empty());
    assert_eq!(components.phase(), Phase::Registering);

    let entries = fixture.journal.entries();
    assert!(entries.contains(&"init renderer (assets loaded: true)".to_string()));
    let deinit: Vec<&str> = entries
        .iter()
        .filter(|entry| entry.starts_with("deinit"))
        .map(String::as_str)
        .collect();
    assert_eq!(deinit.first(), Some(&"deinit renderer"));
    assert_eq!(deinit.len(), 3);
}

#[test]
fn test_serial_run() {
    full_run(false);
}

#[test]
fn test_parallel_run() {
    full_run(true);
}

#[test]
fn test_lookup_by_type() {
    let components = Components::new();
    assert!(components.get::<Window>().is_none());
    let fixture = register_all(&components);
    let found = components.get::<Renderer>().unwrap();
    assert!(Arc::ptr_eq(&found, &fixture.renderer));
}

#[test]
fn test_missing_requirement_is_not_a_dependency() {
    let mut components = Components::new();
    let journal = Arc::new(Journal::default());
    let id = components
        .register(Arc::new(Renderer {
            journal: Arc::clone(&journal),
            assets: Mutex::new(None),
            frames: AtomicU32::new(0),
        }))
        .unwrap();

    components.launch_initialization(false).unwrap();
    components.wait_initialization_complete().unwrap();
    assert!(components.dependencies_of(id).is_empty());
    assert_eq!(
        journal.entries(),
        vec!["init renderer (assets loaded: false)", "post renderer"]
    );
    components.cleanup_components();
}
