use std::time::Duration;

use crate::components::component::ComponentId;
use crate::components::scheduler::Components;

/// Timing information passed to update callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeContext {
    /// Seconds covered by this update
    pub dt: f64,
    /// Simulated seconds elapsed before this update
    pub time: f64,
    pub frame_number: u64,
}

/// Components that opted into per-frame dispatch, in opt-in order.
#[derive(Debug, Default)]
pub(crate) struct UpdateRegistry {
    fixed_step: Vec<ComponentId>,
    once_per_frame: Vec<ComponentId>,
}

impl UpdateRegistry {
    pub(crate) fn add_fixed_step(&mut self, id: ComponentId) {
        if !self.fixed_step.contains(&id) {
            self.fixed_step.push(id);
        }
    }

    pub(crate) fn add_once_per_frame(&mut self, id: ComponentId) {
        if !self.once_per_frame.contains(&id) {
            self.once_per_frame.push(id);
        }
    }

    pub(crate) fn is_fixed_step(&self, id: ComponentId) -> bool {
        self.fixed_step.contains(&id)
    }

    pub(crate) fn is_once_per_frame(&self, id: ComponentId) -> bool {
        self.once_per_frame.contains(&id)
    }

    pub(crate) fn remove(&mut self, id: ComponentId) {
        self.fixed_step.retain(|&other| other != id);
        self.once_per_frame.retain(|&other| other != id);
    }

    pub(crate) fn clear(&mut self) {
        self.fixed_step.clear();
        self.once_per_frame.clear();
    }
}

/// Drives fixed-step and per-frame updates from wall-clock frame times.
///
/// Each `tick` adds the frame's elapsed time (clamped to [`FrameClock::MAX_FRAME_TIME`])
/// to an accumulator, runs as many whole fixed steps as it covers, then runs
/// exactly one once-per-frame update.
#[derive(Debug, Clone)]
pub struct FrameClock {
    fixed_dt: Duration,
    accumulator: Duration,
    simulated: Duration,
    frame_number: u64,
}

impl FrameClock {
    pub const DEFAULT_FIXED_DT: Duration = Duration::from_nanos(1_000_000_000 / 120);
    pub const MAX_FRAME_TIME: Duration = Duration::from_millis(250);

    /// A zero `fixed_dt` falls back to [`FrameClock::DEFAULT_FIXED_DT`].
    pub fn new(fixed_dt: Duration) -> Self {
        let fixed_dt = if fixed_dt.is_zero() {
            Self::DEFAULT_FIXED_DT
        } else {
            fixed_dt
        };
        Self {
            fixed_dt,
            accumulator: Duration::ZERO,
            simulated: Duration::ZERO,
            frame_number: 0,
        }
    }

    pub fn fixed_dt(&self) -> Duration {
        self.fixed_dt
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Simulated time covered by fixed steps so far.
    pub fn simulated_time(&self) -> Duration {
        self.simulated
    }

    /// Advances one frame. Returns the number of fixed steps run.
    pub fn tick(&mut self, components: &Components, elapsed: Duration) -> u32 {
        let frame_time = elapsed.min(Self::MAX_FRAME_TIME);
        self.accumulator += frame_time;

        let mut steps = 0;
        while self.accumulator >= self.fixed_dt {
            let time = TimeContext {
                dt: self.fixed_dt.as_secs_f64(),
                time: self.simulated.as_secs_f64(),
                frame_number: self.frame_number,
            };
            components.update_fixed_step(&time);
            self.accumulator -= self.fixed_dt;
            self.simulated += self.fixed_dt;
            steps += 1;
        }

        components.update_once_per_frame(&TimeContext {
            dt: frame_time.as_secs_f64(),
            time: self.simulated.as_secs_f64(),
            frame_number: self.frame_number,
        });
        self.frame_number += 1;
        steps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FIXED_DT)
    }
}
