mod demo;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{error, info, LevelFilter};
use stagehand_core::{Components, FrameClock, Result, SchedulerConfig};

use demo::Scenario;

/// Stagehand: dependency-ordered component startup and shutdown
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Scheduler config file (.json, .yaml or .toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Initialize worker-eligible components on a thread pool
    #[arg(long)]
    parallel_initialization: bool,

    /// Initialize every component on the main thread
    #[arg(long, conflicts_with = "parallel_initialization")]
    no_parallel_initialization: bool,

    /// Demo dependency graph to run
    #[arg(long, value_enum, default_value_t = Scenario::Chain)]
    scenario: Scenario,

    /// Frames to simulate once everything is ready
    #[arg(long, default_value_t = 3)]
    frames: u32,

    /// Log level unless RUST_LOG says otherwise
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

impl CliArgs {
    fn parallel(&self, config: &SchedulerConfig) -> bool {
        (config.threading.parallel_initialization || self.parallel_initialization)
            && !self.no_parallel_initialization
    }
}

fn run(args: &CliArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => SchedulerConfig::load(path)?,
        None => SchedulerConfig::default(),
    };
    let parallel = args.parallel(&config);

    let mut components = Components::from_config(&config.threading);
    demo::register(&components, args.scenario)?;
    println!(
        "Running {:?} scenario ({} initialization, {} worker threads)",
        args.scenario,
        if parallel { "parallel" } else { "serial" },
        components.worker_threads()
    );

    components.launch_initialization(parallel)?;
    components.wait_initialization_complete()?;
    println!("Completion order: {}", components.completion_order_names().join(" -> "));

    let mut clock = FrameClock::default();
    let mut steps = 0;
    for _ in 0..args.frames {
        steps += clock.tick(&components, Duration::from_millis(16));
    }
    println!("Simulated {} frames ({} fixed steps)", clock.frame_number(), steps);

    let mut teardown = components.completion_order_names();
    teardown.reverse();
    components.cleanup_components();
    println!("Deinitialized: {}", teardown.join(", "));
    info!("Shutdown complete");
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .parse_default_env()
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Component scheduling failed");
            eprintln!("Fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}
