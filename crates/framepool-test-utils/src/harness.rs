//! Signal-level test harness.

use std::sync::Once;

use framepool_core::AllocOutputs;
use tracing_subscriber::EnvFilter;

/// A response pulse observed by [`CycleHarness::await_pulse`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pulse {
    /// Edges clocked before the pulse, counting the pulse edge.
    pub cycles: u64,
    /// Outputs on the pulse edge.
    pub outputs: AllocOutputs,
}

/// Bounded waits on per-cycle signals.
///
/// Models never time out on their own; every wait in a test goes through
/// here so a missing pulse fails the test instead of hanging it.
#[derive(Clone, Copy, Debug)]
pub struct CycleHarness {
    pub max_cycles: u64,
}

impl CycleHarness {
    pub const DEFAULT_MAX_CYCLES: u64 = 64;

    pub fn new(max_cycles: u64) -> Self {
        Self { max_cycles }
    }

    /// Call `step` once per edge until it reports `o_valid`.
    ///
    /// Returns `None` if no pulse arrives within `max_cycles` edges.
    pub fn await_pulse<F>(&self, mut step: F) -> Option<Pulse>
    where
        F: FnMut() -> AllocOutputs,
    {
        (1..=self.max_cycles).find_map(|cycles| {
            let outputs = step();
            outputs.valid.then_some(Pulse { cycles, outputs })
        })
    }

    /// Clock `step` for exactly `n` edges, collecting outputs.
    pub fn run<F, T>(&self, n: u64, mut step: F) -> Vec<T>
    where
        F: FnMut() -> T,
    {
        (0..n).map(|_| step()).collect()
    }
}

impl Default for CycleHarness {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_CYCLES)
    }
}

static TRACING: Once = Once::new();

/// Install a `fmt` subscriber for tests, filtered by `RUST_LOG`
/// (default `info`). Safe to call from every test.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_found_on_third_edge() {
        let mut edge = 0;
        let pulse = CycleHarness::new(8)
            .await_pulse(|| {
                edge += 1;
                AllocOutputs {
                    valid: edge == 3,
                    ..AllocOutputs::default()
                }
            })
            .unwrap();
        assert_eq!(pulse.cycles, 3);
    }

    #[test]
    fn missing_pulse_is_none() {
        let h = CycleHarness::new(4);
        let mut calls = 0;
        assert!(h
            .await_pulse(|| {
                calls += 1;
                AllocOutputs::default()
            })
            .is_none());
        assert_eq!(calls, 4);
    }

    #[test]
    fn init_twice_is_fine() {
        init_test_tracing();
        init_test_tracing();
    }
}
