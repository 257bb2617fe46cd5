//! Request/response allocation channel.
//!
//! [`AllocService`] runs an [`AllocatorUnit`] on its own thread, clocked
//! by its own [`Clock`]. [`AllocChannel`] is the caller's end: each
//! request carries a one-shot reply channel and the caller waits on it
//! with a wall-clock timeout.
//!
//! `request` takes `&mut self`, so one channel can have at most one
//! request in flight. When a request times out the channel keeps its
//! reply receiver. The next command, or `shutdown`, settles it first and
//! releases any grant that arrived late, so an abandoned request never
//! leaks a block. If the whole channel is dropped mid-request the service
//! finds the reply dead on send and rolls the grant back itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, warn};

use framepool_arena::{Allocation, BlockAllocator};
use framepool_core::{AllocError, SizeRequest};

use crate::alloc_unit::AllocatorUnit;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::EngineError;

enum ServiceCommand {
    Allocate {
        size: SizeRequest,
        reply: Sender<Result<Allocation, EngineError>>,
    },
    Release {
        allocation: Allocation,
        reply: Sender<Result<(), AllocError>>,
    },
    Reset {
        reply: Sender<()>,
    },
}

/// Thread-side owner of the allocator unit.
pub struct AllocService {
    unit: AllocatorUnit,
    clock: Clock,
    cmd_rx: Receiver<ServiceCommand>,
    shutdown_flag: Arc<AtomicBool>,
    response_timeout_cycles: u64,
    poll_interval: Duration,
}

impl AllocService {
    /// Validate `config`, build an allocator for its pool, and spawn the
    /// service thread. The service is clocked by `config.write_clock`.
    pub fn spawn(config: &EngineConfig) -> Result<AllocChannel, EngineError> {
        config.validate()?;
        let allocator = BlockAllocator::new(config.pool.block_sizes(), config.pool.capacity_units);
        let (cmd_tx, cmd_rx) = crossbeam_channel::bounded(1);
        let shutdown_flag = Arc::new(AtomicBool::new(false));

        let service = AllocService {
            unit: AllocatorUnit::new(allocator, config.response_latency),
            clock: Clock::new(config.write_clock),
            cmd_rx,
            shutdown_flag: Arc::clone(&shutdown_flag),
            response_timeout_cycles: config.response_timeout_cycles,
            poll_interval: config.poll_interval,
        };
        let thread = thread::Builder::new()
            .name("framepool-alloc".into())
            .spawn(move || service.run())
            .map_err(|e| EngineError::ThreadSpawnFailed {
                reason: format!("framepool-alloc: {e}"),
            })?;

        Ok(AllocChannel {
            cmd_tx: Some(cmd_tx),
            pending: None,
            shutdown_flag,
            thread: Some(thread),
        })
    }

    fn run(mut self) -> AllocatorUnit {
        loop {
            if self.shutdown_flag.load(Ordering::Acquire) {
                break;
            }
            match self.cmd_rx.recv_timeout(self.poll_interval) {
                Ok(cmd) => self.handle(cmd),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!(cycles = self.clock.cycle().0, "allocation service stopped");
        self.unit
    }

    fn handle(&mut self, cmd: ServiceCommand) {
        match cmd {
            ServiceCommand::Allocate { size, reply } => {
                let result = self
                    .unit
                    .request(size, self.response_timeout_cycles, &mut self.clock);
                let granted = result.as_ref().ok().copied();
                if reply.send(result).is_err() {
                    if let Some(allocation) = granted {
                        warn!(addr = %allocation.addr(), "requester gone, grant rolled back");
                        if let Err(e) = self.unit.release(&allocation) {
                            warn!(error = %e, "rollback failed");
                        }
                    }
                }
            }
            ServiceCommand::Release { allocation, reply } => {
                let _ = reply.send(self.unit.release(&allocation));
            }
            ServiceCommand::Reset { reply } => {
                self.unit.reset();
                let _ = reply.send(());
            }
        }
    }
}

/// Caller's end of an [`AllocService`].
///
/// Not `Clone`: one channel, one request in flight.
pub struct AllocChannel {
    cmd_tx: Option<Sender<ServiceCommand>>,
    /// Reply to a request that timed out and has not been settled.
    pending: Option<Receiver<Result<Allocation, EngineError>>>,
    shutdown_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<AllocatorUnit>>,
}

impl AllocChannel {
    fn sender(&self) -> Result<&Sender<ServiceCommand>, EngineError> {
        self.cmd_tx.as_ref().ok_or(EngineError::Shutdown)
    }

    fn wait<T>(rx: &Receiver<T>, timeout: Duration) -> Result<T, EngineError> {
        rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => EngineError::Timeout,
            RecvTimeoutError::Disconnected => EngineError::Shutdown,
        })
    }

    /// Wait out the reply to an earlier timed-out request and give back
    /// any block it granted.
    fn settle_pending(&mut self, timeout: Duration) -> Result<(), EngineError> {
        let Some(rx) = self.pending.take() else {
            return Ok(());
        };
        match rx.recv_timeout(timeout) {
            Ok(Ok(allocation)) => {
                debug!(addr = %allocation.addr(), "late grant released");
                self.release(&allocation, timeout)
            }
            Ok(Err(_)) => Ok(()),
            Err(RecvTimeoutError::Timeout) => {
                self.pending = Some(rx);
                Err(EngineError::Timeout)
            }
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::Shutdown),
        }
    }

    /// Request a block and wait up to `timeout` for the response pulse.
    ///
    /// On [`EngineError::Timeout`] the request stays in flight; a block it
    /// is granted later is released before the next command runs.
    pub fn request(
        &mut self,
        size: SizeRequest,
        timeout: Duration,
    ) -> Result<Allocation, EngineError> {
        self.settle_pending(timeout)?;
        let (reply, reply_rx) = crossbeam_channel::bounded(1);
        self.sender()?
            .send_timeout(ServiceCommand::Allocate { size, reply }, timeout)
            .map_err(|_| EngineError::Shutdown)?;
        match Self::wait(&reply_rx, timeout) {
            Ok(result) => result,
            Err(EngineError::Timeout) => {
                self.pending = Some(reply_rx);
                Err(EngineError::Timeout)
            }
            Err(e) => Err(e),
        }
    }

    /// Release a granted block.
    pub fn release(&mut self, allocation: &Allocation, timeout: Duration) -> Result<(), EngineError> {
        self.settle_pending(timeout)?;
        let (reply, reply_rx) = crossbeam_channel::bounded(1);
        self.sender()?
            .send_timeout(
                ServiceCommand::Release {
                    allocation: *allocation,
                    reply,
                },
                timeout,
            )
            .map_err(|_| EngineError::Shutdown)?;
        Ok(Self::wait(&reply_rx, timeout)??)
    }

    /// Drop every block and start a new generation.
    pub fn reset(&mut self, timeout: Duration) -> Result<(), EngineError> {
        self.settle_pending(timeout)?;
        let (reply, reply_rx) = crossbeam_channel::bounded(1);
        self.sender()?
            .send_timeout(ServiceCommand::Reset { reply }, timeout)
            .map_err(|_| EngineError::Shutdown)?;
        Self::wait(&reply_rx, timeout)
    }

    /// Stop the service and return its allocator unit.
    ///
    /// A block granted to a timed-out request is released into the
    /// returned unit. Returns `None` if the service was already stopped
    /// or its thread panicked.
    pub fn shutdown(&mut self) -> Option<AllocatorUnit> {
        self.shutdown_flag.store(true, Ordering::Release);
        self.cmd_tx.take();
        let mut unit = self.thread.take().and_then(|handle| handle.join().ok())?;
        // The service has stopped, so any late reply is already queued.
        if let Some(Ok(Ok(allocation))) = self.pending.take().map(|rx| rx.try_recv()) {
            if let Err(e) = unit.release(&allocation) {
                warn!(error = %e, "late grant release failed");
            }
        }
        Some(unit)
    }
}

impl Drop for AllocChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}
