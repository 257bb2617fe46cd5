//! User-facing [`FrameEngine`] and its shutdown sequence.
//!
//! The write and read clock domains each run on a dedicated thread.
//! Frames enter through a bounded ingress channel and leave, read back
//! through the wide port and reassembled, on an egress channel.
//!
//! # Architecture
//!
//! ```text
//! User Thread(s)          framepool-write               framepool-read
//!     |                         |                             |
//!     |--submit(frame)--------->| ingress_rx.recv_timeout()   |
//!     |  [bounded(ingress)]     | unit.request(size)          |
//!     |                         | port.write_frame()          |
//!     |                         |--CommittedFrame------------>|
//!     |                         |                             | port.burst()
//!     |                         |                             | reassemble
//!     |<--DeliveredFrame--------------------------------------|
//!     |                         |<--------release(allocation)-|
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::info;

use framepool_arena::FramePool;
use framepool_core::{Addr, Cycle};

use crate::alloc_unit::AllocatorUnit;
use crate::assembler::Frame;
use crate::clock::Clock;
use crate::config::{ConfigError, EngineConfig};
use crate::domain::{ReadDomain, WriteDomain};
use crate::error::EngineError;
use crate::metrics::{EngineMetrics, MetricsCounters};
use crate::ports::{ClockedReadPort, ClockedWritePort};

/// A frame that made the full trip through storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveredFrame {
    /// Base address the frame was stored at.
    pub addr: Addr,
    /// The frame's units, split back out of the read words.
    pub units: Vec<u64>,
    /// Read words the burst took (`ceil(N / RATIO)`).
    pub words: usize,
    /// Write clock edge on which the frame was committed.
    pub committed_at: Cycle,
    /// Read clock edge on which the last word was read.
    pub delivered_at: Cycle,
}

/// Report from [`FrameEngine::shutdown()`].
#[derive(Debug)]
pub struct ShutdownReport {
    /// Total time spent in the shutdown sequence.
    pub total_ms: u64,
    /// Whether the write thread was joined successfully.
    pub write_joined: bool,
    /// Whether the read thread was joined successfully.
    pub read_joined: bool,
    /// Blocks still live in the allocator when the write thread stopped.
    pub live_blocks: usize,
    /// Peak units in use over the engine's lifetime.
    pub high_water: u32,
    /// Final counters.
    pub metrics: EngineMetrics,
}

/// Dual-clock storage engine.
///
/// Owns the frame pool through its two domain threads. Dropping the
/// engine shuts it down.
pub struct FrameEngine {
    ingress_tx: Option<Sender<Frame>>,
    egress_rx: Receiver<DeliveredFrame>,
    shutdown_flag: Arc<AtomicBool>,
    write_thread: Option<JoinHandle<AllocatorUnit>>,
    read_thread: Option<JoinHandle<()>>,
    metrics: Arc<MetricsCounters>,
    config: EngineConfig,
}

impl FrameEngine {
    /// Validate `config`, build the pool, and spawn both domain threads.
    pub fn start(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let pool = FramePool::new(config.pool.clone()).map_err(ConfigError::from)?;
        let (producer, consumer) = pool.split();
        let (allocator, write_port) = producer.into_parts();

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let metrics = Arc::new(MetricsCounters::default());

        let (ingress_tx, ingress_rx) = crossbeam_channel::bounded(config.ingress_capacity);
        let (commit_tx, commit_rx) = crossbeam_channel::bounded(config.ingress_capacity);
        let (release_tx, release_rx) = crossbeam_channel::unbounded();
        let (egress_tx, egress_rx) = crossbeam_channel::unbounded();

        let write = WriteDomain {
            unit: AllocatorUnit::new(allocator, config.response_latency),
            port: ClockedWritePort::new(write_port),
            clock: Clock::new(config.write_clock),
            ingress_rx,
            release_rx,
            commit_tx,
            shutdown_flag: Arc::clone(&shutdown_flag),
            metrics: Arc::clone(&metrics),
            response_timeout_cycles: config.response_timeout_cycles,
            poll_interval: config.poll_interval,
        };
        let read = ReadDomain {
            port: ClockedReadPort::new(consumer.into_port()),
            clock: Clock::new(config.read_clock),
            commit_rx,
            egress_tx,
            release_tx,
            shutdown_flag: Arc::clone(&shutdown_flag),
            metrics: Arc::clone(&metrics),
            poll_interval: config.poll_interval,
        };

        let write_thread = thread::Builder::new()
            .name("framepool-write".into())
            .spawn(move || write.run())
            .map_err(|e| EngineError::ThreadSpawnFailed {
                reason: format!("framepool-write: {e}"),
            })?;
        let read_thread = match thread::Builder::new()
            .name("framepool-read".into())
            .spawn(move || read.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                shutdown_flag.store(true, Ordering::Release);
                let _ = write_thread.join();
                return Err(EngineError::ThreadSpawnFailed {
                    reason: format!("framepool-read: {e}"),
                });
            }
        };

        info!(
            capacity = config.pool.capacity_units,
            mau = %config.pool.mau,
            rd_width = %config.pool.rd_width,
            latency = config.response_latency,
            "frame engine started"
        );

        Ok(Self {
            ingress_tx: Some(ingress_tx),
            egress_rx,
            shutdown_flag,
            write_thread: Some(write_thread),
            read_thread: Some(read_thread),
            metrics,
            config,
        })
    }

    /// Queue a frame for the write domain.
    ///
    /// Non-blocking: a full ingress channel is reported as
    /// [`EngineError::ChannelFull`].
    pub fn submit(&self, frame: Frame) -> Result<(), EngineError> {
        let tx = self.ingress_tx.as_ref().ok_or(EngineError::Shutdown)?;
        tx.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => EngineError::ChannelFull,
            TrySendError::Disconnected(_) => EngineError::Shutdown,
        })?;
        MetricsCounters::bump(&self.metrics.frames_submitted);
        Ok(())
    }

    /// Wait up to `timeout` for the next delivered frame.
    pub fn recv(&self, timeout: Duration) -> Result<DeliveredFrame, EngineError> {
        self.egress_rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => EngineError::Timeout,
            RecvTimeoutError::Disconnected => EngineError::Shutdown,
        })
    }

    /// The next delivered frame, if one is waiting.
    pub fn try_recv(&self) -> Option<DeliveredFrame> {
        self.egress_rx.try_recv().ok()
    }

    /// Snapshot of the engine counters.
    pub fn metrics(&self) -> EngineMetrics {
        self.metrics.snapshot()
    }

    /// The configuration the engine was started with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether [`shutdown()`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.write_thread.is_none() && self.read_thread.is_none()
    }

    /// Stop both domains and join their threads.
    ///
    /// Frames still queued on ingress are discarded. Delivered frames not
    /// yet received stay readable through [`try_recv()`](Self::try_recv).
    /// Calling this twice is harmless.
    pub fn shutdown(&mut self) -> ShutdownReport {
        let start = Instant::now();
        self.shutdown_flag.store(true, Ordering::Release);
        self.ingress_tx.take();

        let (write_joined, live_blocks, high_water) = match self.write_thread.take() {
            Some(handle) => match handle.join() {
                Ok(unit) => (
                    true,
                    unit.allocator().live_count(),
                    unit.allocator().high_water(),
                ),
                Err(_) => (false, 0, 0),
            },
            None => (true, 0, 0),
        };
        let read_joined = match self.read_thread.take() {
            Some(handle) => handle.join().is_ok(),
            None => true,
        };

        let report = ShutdownReport {
            total_ms: start.elapsed().as_millis() as u64,
            write_joined,
            read_joined,
            live_blocks,
            high_water,
            metrics: self.metrics.snapshot(),
        };
        info!(
            total_ms = report.total_ms,
            delivered = report.metrics.frames_delivered,
            rejected = report.metrics.frames_rejected(),
            "frame engine stopped"
        );
        report
    }
}

impl Drop for FrameEngine {
    fn drop(&mut self) {
        if !self.is_shut_down() {
            self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framepool_arena::PoolConfig;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn invalid_config_refuses_to_start() {
        let config = EngineConfig::new(PoolConfig::new(3));
        assert!(matches!(
            FrameEngine::start(config),
            Err(EngineError::Config(ConfigError::Pool(_)))
        ));
    }

    #[test]
    fn single_frame_round_trip() {
        let mut engine = FrameEngine::start(EngineConfig::default()).unwrap();
        engine.submit(Frame::new((0..16).collect())).unwrap();
        let frame = engine.recv(WAIT).unwrap();
        assert_eq!(frame.units, (0..16).collect::<Vec<u64>>());
        assert_eq!(frame.words, 4);

        let report = engine.shutdown();
        assert!(report.write_joined && report.read_joined);
        assert_eq!(report.metrics.frames_delivered, 1);
    }

    #[test]
    fn submit_after_shutdown() {
        let mut engine = FrameEngine::start(EngineConfig::default()).unwrap();
        engine.shutdown();
        assert_eq!(
            engine.submit(Frame::new(vec![1])),
            Err(EngineError::Shutdown)
        );
        assert!(engine.is_shut_down());
        // Second shutdown is a no-op.
        assert!(engine.shutdown().write_joined);
    }

    #[test]
    fn recv_times_out_when_idle() {
        let engine = FrameEngine::start(EngineConfig::default()).unwrap();
        assert_eq!(
            engine.recv(Duration::from_millis(20)),
            Err(EngineError::Timeout)
        );
    }
}
