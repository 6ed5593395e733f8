mod click;
mod scheduler;
mod wait;

pub use click::{ClickOutcome, ClickSimulation};
pub use scheduler::{TickScheduler, DEFAULT_MAX_RUN_TICKS};
pub use wait::{WaitForever, WaitTicks, WaitUntil};

use crate::ProbeError;

/// One iteration of the host's main update loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub index: u64,
    pub dt_seconds: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPoll {
    /// Yield until the next tick.
    Pending,
    Ready,
}

/// A resumable operation driven once per tick. Returning `Pending` is the
/// only way to suspend; state that must survive the suspension lives on the
/// task itself.
pub trait ProbeTask<H: ?Sized> {
    fn poll(&mut self, host: &mut H, tick: Tick) -> Result<TaskPoll, ProbeError>;
}

/// Hosts that want to know which tick is running.
pub trait TickHost {
    fn begin_tick(&mut self, tick: Tick);
}
