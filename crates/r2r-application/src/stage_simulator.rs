//! Cosmetic progress labels for an in-flight submission.

use std::time::Duration;

use r2r_core::session::{PROCESSING_STAGES, STAGE_INTERVAL};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Yields one stage label per period, at most once each, in order.
///
/// The first label is due one full period after creation. Dropping the
/// simulator cancels it; no label is produced after that.
pub struct StageSimulator {
    ticker: Interval,
    stages: &'static [&'static str],
    next: usize,
}

impl StageSimulator {
    pub fn new() -> Self {
        Self::with_schedule(&PROCESSING_STAGES, STAGE_INTERVAL)
    }

    pub fn with_schedule(stages: &'static [&'static str], period: Duration) -> Self {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            ticker,
            stages,
            next: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.next >= self.stages.len()
    }

    /// Waits for the next tick and returns its label. Cancel safe.
    pub async fn next_stage(&mut self) -> Option<&'static str> {
        if self.is_exhausted() {
            return None;
        }
        self.ticker.tick().await;
        let stage = self.stages[self.next];
        self.next += 1;
        Some(stage)
    }
}

impl Default for StageSimulator {
    fn default() -> Self {
        Self::new()
    }
}
