//! Counters for the dual-clock engine.
//!
//! Domain threads bump [`MetricsCounters`] with relaxed atomics;
//! [`FrameEngine::metrics()`](crate::FrameEngine::metrics) copies them
//! into a plain [`EngineMetrics`] snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

use framepool_core::AllocError;

/// Point-in-time copy of the engine counters.
///
/// All fields are cumulative since the engine started.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineMetrics {
    /// Frames accepted onto the ingress channel.
    pub frames_submitted: u64,
    /// Frames the allocator granted a block for.
    pub frames_granted: u64,
    /// Frames handed out on the egress channel.
    pub frames_delivered: u64,
    /// Frames dropped because their size exceeded the maximum.
    pub rejected_too_large: u64,
    /// Frames dropped because no contiguous range was free.
    pub rejected_exhausted: u64,
    /// Frames dropped because the assembler discarded part of them.
    pub frames_truncated: u64,
    /// Allocator strobes dropped because a request was in flight.
    pub dropped_strobes: u64,
    /// Allocator requests with no pulse within the cycle budget.
    pub response_timeouts: u64,
    /// Port accesses that failed.
    pub storage_errors: u64,
    /// Units stored by the write domain.
    pub units_written: u64,
    /// Words produced by the read domain.
    pub words_read: u64,
    /// Write clock edges.
    pub write_cycles: u64,
    /// Read clock edges.
    pub read_cycles: u64,
}

impl EngineMetrics {
    /// Frames dropped for any allocation reason.
    pub fn frames_rejected(&self) -> u64 {
        self.rejected_too_large + self.rejected_exhausted
    }
}

#[derive(Debug, Default)]
pub(crate) struct MetricsCounters {
    pub frames_submitted: AtomicU64,
    pub frames_granted: AtomicU64,
    pub frames_delivered: AtomicU64,
    pub rejected_too_large: AtomicU64,
    pub rejected_exhausted: AtomicU64,
    pub frames_truncated: AtomicU64,
    pub dropped_strobes: AtomicU64,
    pub response_timeouts: AtomicU64,
    pub storage_errors: AtomicU64,
    pub units_written: AtomicU64,
    pub words_read: AtomicU64,
    pub write_cycles: AtomicU64,
    pub read_cycles: AtomicU64,
}

impl MetricsCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn store(counter: &AtomicU64, value: u64) {
        counter.store(value, Ordering::Relaxed);
    }

    /// Count a refused allocation under its cause.
    pub fn record_rejection(&self, err: &AllocError) {
        match err {
            AllocError::RequestTooLarge { .. } => Self::bump(&self.rejected_too_large),
            _ => Self::bump(&self.rejected_exhausted),
        }
    }

    pub fn snapshot(&self) -> EngineMetrics {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        EngineMetrics {
            frames_submitted: get(&self.frames_submitted),
            frames_granted: get(&self.frames_granted),
            frames_delivered: get(&self.frames_delivered),
            rejected_too_large: get(&self.rejected_too_large),
            rejected_exhausted: get(&self.rejected_exhausted),
            frames_truncated: get(&self.frames_truncated),
            dropped_strobes: get(&self.dropped_strobes),
            response_timeouts: get(&self.response_timeouts),
            storage_errors: get(&self.storage_errors),
            units_written: get(&self.units_written),
            words_read: get(&self.words_read),
            write_cycles: get(&self.write_cycles),
            read_cycles: get(&self.read_cycles),
        }
    }
}
