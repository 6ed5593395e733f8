use serde::Serialize;

use crate::task::ClickOutcome;
use crate::ProbeError;

/// Counters kept by the driver across every operation it ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProbeStats {
    pub ticks: u64,
    pub clicks_simulated: u64,
    pub clicks_without_receiver: u64,
    pub events_delivered: u64,
    pub events_dropped: u64,
    pub waits_completed: u64,
    pub waits_timed_out: u64,
    /// Waits cut short by anything other than their own timeout.
    pub waits_aborted: u64,
}

impl ProbeStats {
    pub(crate) fn record_click(&mut self, outcome: &ClickOutcome) {
        self.clicks_simulated = self.clicks_simulated.saturating_add(1);
        if outcome.receiver.is_none() {
            self.clicks_without_receiver = self.clicks_without_receiver.saturating_add(1);
            return;
        }
        for handler in [
            outcome.down_handler,
            outcome.up_handler,
            outcome.click_handler,
        ] {
            if handler.is_some() {
                self.events_delivered = self.events_delivered.saturating_add(1);
            } else {
                self.events_dropped = self.events_dropped.saturating_add(1);
            }
        }
    }

    pub(crate) fn record_wait(&mut self, result: &Result<(), ProbeError>) {
        let counter = match result {
            Ok(()) => &mut self.waits_completed,
            Err(ProbeError::Timeout { .. }) => &mut self.waits_timed_out,
            Err(_) => &mut self.waits_aborted,
        };
        *counter = counter.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ScreenPoint;
    use crate::hit::EntityId;

    fn outcome(receiver: Option<EntityId>, handler: Option<EntityId>) -> ClickOutcome {
        ClickOutcome {
            position: ScreenPoint::default(),
            receiver,
            down_handler: handler,
            up_handler: None,
            click_handler: handler,
            down_tick: None,
            release_tick: None,
        }
    }

    #[test]
    fn click_without_receiver_counts_no_events() {
        let mut stats = ProbeStats::default();
        stats.record_click(&outcome(None, None));
        assert_eq!(stats.clicks_simulated, 1);
        assert_eq!(stats.clicks_without_receiver, 1);
        assert_eq!(stats.events_delivered + stats.events_dropped, 0);
    }

    #[test]
    fn click_counts_delivered_and_dropped_events() {
        let mut stats = ProbeStats::default();
        stats.record_click(&outcome(Some(EntityId(1)), Some(EntityId(1))));
        assert_eq!(stats.events_delivered, 2);
        assert_eq!(stats.events_dropped, 1);
    }

    #[test]
    fn waits_are_counted_by_result() {
        let mut stats = ProbeStats::default();
        stats.record_wait(&Ok(()));
        stats.record_wait(&Err(ProbeError::Timeout {
            timeout_seconds: 1.0,
        }));
        stats.record_wait(&Err(ProbeError::TickBudgetExhausted { ticks: 3 }));
        assert_eq!(stats.waits_completed, 1);
        assert_eq!(stats.waits_timed_out, 1);
        assert_eq!(stats.waits_aborted, 1);
    }
}
