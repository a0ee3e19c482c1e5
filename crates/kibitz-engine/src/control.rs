//! Search control: stop flag, time budget and node budget.

use std::thread;
use std::time::{Duration, Instant};

use kibitz_core::{SearchLimits, StopHandle};

/// How often the coordinator re-checks the clock while holding its answer.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Decides when a search should stop and when it may answer.
///
/// Supports three modes:
/// - **Infinite**: no time pressure, only answers once the stop flag is set
/// - **Timed**: `movetime` is a hard limit, after which the stop flag is raised
/// - **Untimed**: answers as soon as the work is done and `min_think` has passed
#[derive(Debug)]
pub struct SearchControl {
    stop: StopHandle,
    start: Instant,
    hard_limit: Option<Duration>,
    min_think: Duration,
    max_nodes: Option<u64>,
    infinite: bool,
}

impl SearchControl {
    /// Start the clock for a search under `limits`.
    pub fn new(stop: StopHandle, limits: &SearchLimits) -> Self {
        Self {
            stop,
            start: Instant::now(),
            hard_limit: limits.movetime,
            min_think: limits.min_think,
            max_nodes: limits.nodes,
            infinite: limits.infinite,
        }
    }

    /// Check whether the search should abort now.
    ///
    /// When the hard limit fires, the stop flag is set so subsequent calls
    /// return immediately without re-checking the clock.
    pub fn should_stop(&self, nodes: u64) -> bool {
        if self.stop.is_stopped() {
            return true;
        }

        if self.max_nodes.is_some_and(|max| nodes >= max) {
            return true;
        }

        if let Some(hard) = self.hard_limit
            && self.elapsed() >= hard
        {
            self.stop.stop();
            return true;
        }

        false
    }

    /// Whether a finished search may hand its move back yet.
    pub fn may_answer(&self) -> bool {
        if self.should_stop(0) {
            return true;
        }
        !self.infinite && self.elapsed() >= self.min_think
    }

    /// Block until [`may_answer`](Self::may_answer) holds.
    pub fn hold_answer(&self) {
        while !self.may_answer() {
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Elapsed time since the search started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
