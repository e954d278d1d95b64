//! Pacing side channel invoked after every flow step

use std::time::Duration;

/// Slows the stream down while a job is outstanding
pub trait Pacer {
    /// Called after flow `flow_id` (1-based, counted over the whole stream)
    fn pace(&mut self, flow_id: u64, retraining: bool);
}

/// Never sleeps
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

impl Pacer for NoPacing {
    fn pace(&mut self, _flow_id: u64, _retraining: bool) {}
}

/// Sleeps `delay` after every flow beyond `after_flow` while retraining
///
/// Emulates the arrival rate of a live network so a background job can finish
/// before the stream runs out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepPacer {
    after_flow: u64,
    delay: Duration,
}

impl SleepPacer {
    pub fn new(after_flow: u64, delay: Duration) -> Self {
        Self { after_flow, delay }
    }

    /// Production pacing: start `margin` flows before the end of the first detector window
    pub fn for_window(window_size: usize, margin: usize, delay: Duration) -> Self {
        Self::new(window_size.saturating_sub(margin) as u64, delay)
    }

    pub fn should_sleep(&self, flow_id: u64, retraining: bool) -> bool {
        retraining && flow_id > self.after_flow && !self.delay.is_zero()
    }
}

impl Pacer for SleepPacer {
    fn pace(&mut self, flow_id: u64, retraining: bool) {
        if self.should_sleep(flow_id, retraining) {
            std::thread::sleep(self.delay);
        }
    }
}
