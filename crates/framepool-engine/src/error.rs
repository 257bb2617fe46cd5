//! Engine-level error type.

use std::error::Error;
use std::fmt;

use framepool_core::{AllocError, StorageError};

use crate::config::ConfigError;

/// Errors surfaced by the signal-level models and the frame engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// Engine configuration is invalid.
    Config(ConfigError),
    /// The allocator answered with `o_err` set.
    Alloc(AllocError),
    /// A port access could not be carried out.
    Storage(StorageError),
    /// No response pulse within the caller's cycle budget.
    ResponseTimeout {
        /// Cycles waited after the strobe.
        cycles: u64,
    },
    /// Nothing arrived within the caller's wall-clock budget.
    Timeout,
    /// The engine or service has shut down.
    Shutdown,
    /// The ingress channel is full (back-pressure).
    ChannelFull,
    /// A clock domain thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Alloc(e) => write!(f, "allocation: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::ResponseTimeout { cycles } => {
                write!(f, "no allocator response within {cycles} cycles")
            }
            Self::Timeout => write!(f, "timed out"),
            Self::Shutdown => write!(f, "engine has shut down"),
            Self::ChannelFull => write!(f, "ingress channel full"),
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Alloc(e) => Some(e),
            Self::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<AllocError> for EngineError {
    fn from(e: AllocError) -> Self {
        Self::Alloc(e)
    }
}

impl From<StorageError> for EngineError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}
