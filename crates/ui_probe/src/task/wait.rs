use tracing::{debug, warn};

use super::{ProbeTask, TaskPoll, Tick};
use crate::ProbeError;

/// Re-evaluates a predicate once per tick. Fails with
/// [`ProbeError::Timeout`] once the accumulated tick time exceeds the
/// timeout without the predicate holding.
pub struct WaitUntil<P> {
    predicate: P,
    timeout_seconds: f32,
    elapsed_seconds: f32,
}

impl<P> WaitUntil<P> {
    /// A NaN or negative timeout is treated as zero.
    pub fn new(predicate: P, timeout_seconds: f32) -> Self {
        let timeout_seconds = if timeout_seconds >= 0.0 {
            timeout_seconds
        } else {
            warn!(timeout_seconds, "wait_timeout_invalid_using_zero");
            0.0
        };
        Self {
            predicate,
            timeout_seconds,
            elapsed_seconds: 0.0,
        }
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed_seconds
    }
}

impl<H, P> ProbeTask<H> for WaitUntil<P>
where
    P: FnMut(&H) -> bool,
{
    fn poll(&mut self, host: &mut H, tick: Tick) -> Result<TaskPoll, ProbeError> {
        if (self.predicate)(&*host) {
            debug!(
                tick = tick.index,
                elapsed_seconds = self.elapsed_seconds,
                "wait_condition_met"
            );
            return Ok(TaskPoll::Ready);
        }

        self.elapsed_seconds += tick.dt_seconds;
        if self.elapsed_seconds > self.timeout_seconds {
            debug!(
                tick = tick.index,
                timeout_seconds = self.timeout_seconds,
                "wait_timed_out"
            );
            return Err(ProbeError::Timeout {
                timeout_seconds: self.timeout_seconds,
            });
        }
        Ok(TaskPoll::Pending)
    }
}

/// Yields for a fixed number of ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTicks {
    remaining: u32,
}

impl WaitTicks {
    pub fn new(ticks: u32) -> Self {
        Self { remaining: ticks }
    }
}

impl<H> ProbeTask<H> for WaitTicks {
    fn poll(&mut self, _host: &mut H, _tick: Tick) -> Result<TaskPoll, ProbeError> {
        if self.remaining == 0 {
            return Ok(TaskPoll::Ready);
        }
        self.remaining -= 1;
        Ok(TaskPoll::Pending)
    }
}

/// Never completes. Drive it with a bounded run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitForever;

impl<H> ProbeTask<H> for WaitForever {
    fn poll(&mut self, _host: &mut H, _tick: Tick) -> Result<TaskPoll, ProbeError> {
        Ok(TaskPoll::Pending)
    }
}
