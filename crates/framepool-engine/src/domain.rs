//! Write and read clock domain loops.
//!
//! Each domain is moved onto its own thread by
//! [`FrameEngine::start`](crate::FrameEngine::start) and owns everything
//! it clocks. The only shared state is the storage behind the two ports,
//! the metrics counters, and the shutdown flag.
//!
//! ```text
//!  ingress ──▶ WriteDomain ──CommittedFrame──▶ ReadDomain ──▶ egress
//!                  ▲                               │
//!                  └────────── release ◀───────────┘
//! ```
//!
//! The commit channel is the hand-off point: the write domain sends a
//! frame only after its last unit is stored, so the read domain never
//! targets a block whose write is in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, trace, warn};

use framepool_arena::Allocation;
use framepool_core::{AllocError, Cycle, SizeRequest};

use crate::alloc_unit::AllocatorUnit;
use crate::assembler::Frame;
use crate::clock::Clock;
use crate::engine::DeliveredFrame;
use crate::error::EngineError;
use crate::metrics::MetricsCounters;
use crate::ports::{ClockedReadPort, ClockedWritePort};

/// A fully written block handed from the write domain to the read domain.
pub(crate) struct CommittedFrame {
    pub allocation: Allocation,
    /// Write clock edge on which the last unit was stored.
    pub committed_at: Cycle,
}

/// State held by the write thread's main loop.
pub(crate) struct WriteDomain {
    pub unit: AllocatorUnit,
    pub port: ClockedWritePort,
    pub clock: Clock,
    pub ingress_rx: Receiver<Frame>,
    pub release_rx: Receiver<Allocation>,
    pub commit_tx: Sender<CommittedFrame>,
    pub shutdown_flag: Arc<AtomicBool>,
    pub metrics: Arc<MetricsCounters>,
    pub response_timeout_cycles: u64,
    pub poll_interval: Duration,
}

impl WriteDomain {
    /// Run until shutdown or until the ingress side hangs up.
    ///
    /// Returns the allocator unit so the caller can report final state.
    pub fn run(mut self) -> AllocatorUnit {
        loop {
            self.drain_releases();
            if self.shutdown_flag.load(Ordering::Acquire) {
                break;
            }
            match self.ingress_rx.recv_timeout(self.poll_interval) {
                Ok(frame) => {
                    if !self.process(frame) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.drain_releases();
        debug!(
            cycles = self.clock.cycle().0,
            live = self.unit.allocator().live_count(),
            "write domain stopped"
        );
        self.unit
    }

    fn drain_releases(&mut self) {
        while let Ok(allocation) = self.release_rx.try_recv() {
            if let Err(e) = self.unit.release(&allocation) {
                warn!(error = %e, "release from read domain failed");
            }
        }
    }

    /// Allocate, write and commit one frame. Returns `false` once the
    /// read domain has gone away.
    fn process(&mut self, frame: Frame) -> bool {
        self.drain_releases();
        if frame.len() > SizeRequest::MAX as usize {
            let e = AllocError::RequestTooLarge {
                requested: u32::try_from(frame.len()).unwrap_or(u32::MAX),
                max: self.unit.allocator().sizes().max_request(),
            };
            self.metrics.record_rejection(&e);
            debug!(len = frame.len(), error = %e, "frame dropped");
            return true;
        }
        // The block would be sized for the wire length but only the kept
        // units get written, leaving stale slots in the tail.
        if frame.is_truncated() {
            MetricsCounters::bump(&self.metrics.frames_truncated);
            debug!(
                len = frame.len(),
                kept = frame.units().len(),
                "truncated frame dropped"
            );
            return true;
        }
        let size = frame.size_request();
        let result = self
            .unit
            .request(size, self.response_timeout_cycles, &mut self.clock);
        MetricsCounters::store(&self.metrics.dropped_strobes, self.unit.dropped_strobes());

        let allocation = match result {
            Ok(allocation) => allocation,
            Err(EngineError::Alloc(e)) => {
                self.metrics.record_rejection(&e);
                debug!(len = frame.len(), error = %e, "frame dropped");
                self.sync_cycles();
                return true;
            }
            Err(e) => {
                MetricsCounters::bump(&self.metrics.response_timeouts);
                warn!(len = frame.len(), error = %e, "frame dropped");
                self.sync_cycles();
                return true;
            }
        };
        MetricsCounters::bump(&self.metrics.frames_granted);

        if let Err(e) = self
            .port
            .write_frame(allocation, frame.units(), &mut self.clock)
        {
            MetricsCounters::bump(&self.metrics.storage_errors);
            warn!(addr = %allocation.addr(), error = %e, "frame write failed");
            if let Err(e) = self.unit.release(&allocation) {
                warn!(error = %e, "rollback release failed");
            }
            self.sync_cycles();
            return true;
        }
        self.sync_cycles();

        let committed = CommittedFrame {
            allocation,
            committed_at: self.clock.cycle(),
        };
        trace!(addr = %allocation.addr(), len = allocation.len(), "frame committed");
        self.commit_tx.send(committed).is_ok()
    }

    fn sync_cycles(&self) {
        MetricsCounters::store(&self.metrics.write_cycles, self.clock.cycle().0);
        MetricsCounters::store(&self.metrics.units_written, self.port.units_written());
    }
}

/// State held by the read thread's main loop.
pub(crate) struct ReadDomain {
    pub port: ClockedReadPort,
    pub clock: Clock,
    pub commit_rx: Receiver<CommittedFrame>,
    pub egress_tx: Sender<DeliveredFrame>,
    pub release_tx: Sender<Allocation>,
    pub shutdown_flag: Arc<AtomicBool>,
    pub metrics: Arc<MetricsCounters>,
    pub poll_interval: Duration,
}

impl ReadDomain {
    /// Run until shutdown or until the write domain hangs up.
    pub fn run(mut self) {
        loop {
            if self.shutdown_flag.load(Ordering::Acquire) {
                break;
            }
            match self.commit_rx.recv_timeout(self.poll_interval) {
                Ok(committed) => self.deliver(committed),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!(cycles = self.clock.cycle().0, "read domain stopped");
    }

    fn deliver(&mut self, committed: CommittedFrame) {
        let allocation = committed.allocation;
        let burst = self.port.burst(&allocation, &mut self.clock);
        MetricsCounters::store(&self.metrics.read_cycles, self.clock.cycle().0);
        MetricsCounters::store(&self.metrics.words_read, self.port.words_read());

        // The words are copied out, so the block can go back before the
        // frame is delivered. The write domain may already be gone
        // during shutdown.
        let _ = self.release_tx.send(allocation);

        match burst {
            Ok(words) => {
                let ratio = self.port.port().ratio();
                let delivered = DeliveredFrame {
                    addr: allocation.addr(),
                    units: ratio.reassemble(&words, allocation.len() as usize),
                    words: words.len(),
                    committed_at: committed.committed_at,
                    delivered_at: self.clock.cycle(),
                };
                if self.egress_tx.send(delivered).is_ok() {
                    MetricsCounters::bump(&self.metrics.frames_delivered);
                }
            }
            Err(e) => {
                MetricsCounters::bump(&self.metrics.storage_errors);
                warn!(addr = %allocation.addr(), error = %e, "frame read failed");
            }
        }
    }
}
