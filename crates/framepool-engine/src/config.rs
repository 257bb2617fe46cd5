//! Engine configuration, validation, and error types.
//!
//! [`EngineConfig`] is the builder-input for [`FrameEngine`](crate::FrameEngine)
//! and [`AllocService`](crate::AllocService). [`validate()`](EngineConfig::validate)
//! checks structural invariants at startup, including the pool's own.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use framepool_arena::{ConfigError as PoolConfigError, PoolConfig};

// ── ClockConfig ────────────────────────────────────────────────────

/// Pacing for one clock domain.
///
/// A zero period free-runs: edges happen as fast as the thread can
/// clock them. A non-zero period sleeps that long per edge, which lets
/// tests give the two domains visibly different rates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClockConfig {
    /// Wall-clock time per edge. Default: zero (free-running).
    pub period: Duration,
}

impl ClockConfig {
    /// A free-running clock.
    pub fn free_running() -> Self {
        Self::default()
    }

    /// A clock paced at `period` per edge.
    pub fn with_period(period: Duration) -> Self {
        Self { period }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`EngineConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Pool configuration is invalid.
    Pool(PoolConfigError),
    /// Response latency of zero cycles.
    ZeroLatency,
    /// Response timeout does not leave room for the response latency.
    TimeoutBelowLatency {
        /// Configured timeout in cycles.
        timeout: u64,
        /// Configured latency in cycles.
        latency: u32,
    },
    /// Ingress capacity is zero.
    IngressQueueZero,
    /// Poll interval is zero.
    ZeroPollInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pool(e) => write!(f, "pool: {e}"),
            Self::ZeroLatency => write!(f, "response_latency must be at least 1 cycle"),
            Self::TimeoutBelowLatency { timeout, latency } => {
                write!(
                    f,
                    "response_timeout_cycles {timeout} is below response_latency {latency}"
                )
            }
            Self::IngressQueueZero => write!(f, "ingress_capacity must be at least 1"),
            Self::ZeroPollInterval => write!(f, "poll_interval must be non-zero"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Pool(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PoolConfigError> for ConfigError {
    fn from(e: PoolConfigError) -> Self {
        Self::Pool(e)
    }
}

// ── EngineConfig ───────────────────────────────────────────────────

/// Complete configuration for the signal-level engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Storage and allocator parameters.
    pub pool: PoolConfig,
    /// Cycles from the `alloc_en` edge to the `o_valid` pulse. Default: 2.
    pub response_latency: u32,
    /// Cycles a caller waits for `o_valid` before declaring a protocol
    /// violation. Default: 64.
    pub response_timeout_cycles: u64,
    /// Frames buffered between the decode pipeline and the write domain.
    /// Default: 64.
    pub ingress_capacity: usize,
    /// Write (producer) clock.
    pub write_clock: ClockConfig,
    /// Read (consumer) clock.
    pub read_clock: ClockConfig,
    /// How long a domain thread blocks on an empty channel before
    /// re-checking the shutdown flag. Default: 1 ms.
    pub poll_interval: Duration,
}

impl EngineConfig {
    /// Default response latency in cycles.
    pub const DEFAULT_RESPONSE_LATENCY: u32 = 2;

    /// Default response timeout in cycles.
    pub const DEFAULT_RESPONSE_TIMEOUT_CYCLES: u64 = 64;

    /// Default ingress capacity in frames.
    pub const DEFAULT_INGRESS_CAPACITY: usize = 64;

    /// Create an engine config around a pool config.
    pub fn new(pool: PoolConfig) -> Self {
        Self {
            pool,
            response_latency: Self::DEFAULT_RESPONSE_LATENCY,
            response_timeout_cycles: Self::DEFAULT_RESPONSE_TIMEOUT_CYCLES,
            ingress_capacity: Self::DEFAULT_INGRESS_CAPACITY,
            write_clock: ClockConfig::free_running(),
            read_clock: ClockConfig::free_running(),
            poll_interval: Duration::from_millis(1),
        }
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Pool.
        self.pool.validate()?;
        // 2. Latency >= 1: the pulse can never coincide with the strobe.
        if self.response_latency == 0 {
            return Err(ConfigError::ZeroLatency);
        }
        // 3. Timeout must outlast the latency.
        if self.response_timeout_cycles < self.response_latency as u64 {
            return Err(ConfigError::TimeoutBelowLatency {
                timeout: self.response_timeout_cycles,
                latency: self.response_latency,
            });
        }
        // 4. Ingress >= 1.
        if self.ingress_capacity == 0 {
            return Err(ConfigError::IngressQueueZero);
        }
        // 5. Poll interval.
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}
