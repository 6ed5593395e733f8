use tracing::{debug, warn};

use super::{ProbeTask, TaskPoll, Tick, TickHost};
use crate::ProbeError;

/// Upper bound for `run_to_completion` so a task that never finishes cannot
/// hang the caller. Ten minutes at 60 ticks per second.
pub const DEFAULT_MAX_RUN_TICKS: u64 = 36_000;

/// Fixed-step tick source. The tick index is monotonic across runs.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    dt_seconds: f32,
    next_index: u64,
    max_run_ticks: u64,
}

impl TickScheduler {
    pub fn new(dt_seconds: f32) -> Self {
        let dt_seconds = if dt_seconds.is_finite() && dt_seconds > 0.0 {
            dt_seconds
        } else {
            warn!(dt_seconds, "scheduler_invalid_dt_using_one");
            1.0
        };
        Self {
            dt_seconds,
            next_index: 0,
            max_run_ticks: DEFAULT_MAX_RUN_TICKS,
        }
    }

    pub fn with_max_run_ticks(mut self, max_run_ticks: u64) -> Self {
        self.max_run_ticks = max_run_ticks.max(1);
        self
    }

    pub fn dt_seconds(&self) -> f32 {
        self.dt_seconds
    }

    /// Number of ticks issued so far.
    pub fn ticks_elapsed(&self) -> u64 {
        self.next_index
    }

    fn next_tick(&mut self) -> Tick {
        let tick = Tick {
            index: self.next_index,
            dt_seconds: self.dt_seconds,
        };
        self.next_index = self.next_index.saturating_add(1);
        tick
    }

    /// Polls `task` once per tick until it is ready or fails.
    pub fn run_to_completion<H, T>(&mut self, task: &mut T, host: &mut H) -> Result<(), ProbeError>
    where
        H: TickHost + ?Sized,
        T: ProbeTask<H> + ?Sized,
    {
        let start = self.next_index;
        if self.run_for_ticks(task, host, self.max_run_ticks)? {
            return Ok(());
        }
        Err(ProbeError::TickBudgetExhausted {
            ticks: self.next_index.saturating_sub(start),
        })
    }

    /// Polls `task` for at most `max_ticks` ticks. Returns whether it
    /// finished.
    pub fn run_for_ticks<H, T>(
        &mut self,
        task: &mut T,
        host: &mut H,
        max_ticks: u64,
    ) -> Result<bool, ProbeError>
    where
        H: TickHost + ?Sized,
        T: ProbeTask<H> + ?Sized,
    {
        for _ in 0..max_ticks {
            let tick = self.next_tick();
            host.begin_tick(tick);
            match task.poll(host, tick)? {
                TaskPoll::Ready => {
                    debug!(tick = tick.index, "task_ready");
                    return Ok(true);
                }
                TaskPoll::Pending => {}
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingHost {
        ticks: Vec<u64>,
    }

    impl TickHost for RecordingHost {
        fn begin_tick(&mut self, tick: Tick) {
            self.ticks.push(tick.index);
        }
    }

    struct CountDown {
        remaining: u32,
    }

    impl ProbeTask<RecordingHost> for CountDown {
        fn poll(&mut self, _host: &mut RecordingHost, _tick: Tick) -> Result<TaskPoll, ProbeError> {
            if self.remaining == 0 {
                return Ok(TaskPoll::Ready);
            }
            self.remaining -= 1;
            Ok(TaskPoll::Pending)
        }
    }

    #[test]
    fn runs_one_poll_per_tick_until_ready() {
        let mut scheduler = TickScheduler::new(0.5);
        let mut host = RecordingHost::default();
        let mut task = CountDown { remaining: 2 };

        scheduler
            .run_to_completion(&mut task, &mut host)
            .expect("task completes");
        assert_eq!(host.ticks, vec![0, 1, 2]);
        assert_eq!(scheduler.ticks_elapsed(), 3);
    }

    #[test]
    fn tick_index_continues_across_runs() {
        let mut scheduler = TickScheduler::new(0.5);
        let mut host = RecordingHost::default();
        scheduler
            .run_to_completion(&mut CountDown { remaining: 1 }, &mut host)
            .expect("first run");
        scheduler
            .run_to_completion(&mut CountDown { remaining: 0 }, &mut host)
            .expect("second run");
        assert_eq!(host.ticks, vec![0, 1, 2]);
    }

    #[test]
    fn bounded_run_reports_unfinished_task() {
        let mut scheduler = TickScheduler::new(0.5);
        let mut host = RecordingHost::default();
        let finished = scheduler
            .run_for_ticks(&mut CountDown { remaining: 10 }, &mut host, 4)
            .expect("bounded run");
        assert!(!finished);
        assert_eq!(host.ticks.len(), 4);
    }

    #[test]
    fn run_to_completion_gives_up_after_budget() {
        let mut scheduler = TickScheduler::new(0.5).with_max_run_ticks(3);
        let mut host = RecordingHost::default();
        let error = scheduler
            .run_to_completion(&mut CountDown { remaining: 10 }, &mut host)
            .expect_err("budget exhausted");
        assert!(matches!(error, ProbeError::TickBudgetExhausted { ticks: 3 }));
    }

    #[test]
    fn invalid_dt_is_replaced() {
        assert_eq!(TickScheduler::new(0.0).dt_seconds(), 1.0);
        assert_eq!(TickScheduler::new(f32::NAN).dt_seconds(), 1.0);
    }
}
