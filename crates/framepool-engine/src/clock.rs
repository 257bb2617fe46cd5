//! Per-domain clock.

use std::time::Duration;

use framepool_core::Cycle;

use crate::config::ClockConfig;

/// Edge counter and pacer for one clock domain.
///
/// Every model in a domain is clocked by calling its `clock()` method
/// once per [`edge()`](Clock::edge). Two domains each own a `Clock`;
/// their cycle counts are unrelated.
#[derive(Debug)]
pub struct Clock {
    period: Duration,
    cycle: Cycle,
}

impl Clock {
    /// Create a clock from its config.
    pub fn new(config: ClockConfig) -> Self {
        Self {
            period: config.period,
            cycle: Cycle(0),
        }
    }

    /// A free-running clock starting at cycle 0.
    pub fn free_running() -> Self {
        Self::new(ClockConfig::free_running())
    }

    /// Advance one edge, sleeping for the period if paced.
    pub fn edge(&mut self) -> Cycle {
        if !self.period.is_zero() {
            std::thread::sleep(self.period);
        }
        self.cycle = Cycle(self.cycle.0 + 1);
        self.cycle
    }

    /// Edges so far.
    pub fn cycle(&self) -> Cycle {
        self.cycle
    }
}
