//! Pool configuration parameters.

use std::error::Error;
use std::fmt;

use framepool_core::{RangeError, Ratio, SizeRequest, Width};

use crate::size_class::BlockSizes;

/// Configuration for the frame pool.
///
/// Mirrors the build-time parameters of the storage engine (`MAU`,
/// `RD_WIDTH`) plus the allocator's sizing rules. Validated at
/// construction; all values are immutable after creation.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Number of MAU-wide storage slots in the pool.
    ///
    /// Default: 1024. Must be a multiple of `granularity_units` and hold
    /// at least one largest block.
    pub capacity_units: u32,

    /// Largest grantable request, inclusive.
    ///
    /// Default: 16. A request of 14 is granted and 18 rejected under the
    /// default; set 15 for a strict-less-than-16 threshold. At most
    /// [`SizeRequest::MAX`].
    pub max_request_units: u32,

    /// Rounding step for block sizes.
    ///
    /// Default: 4. Must be a power of two and a multiple of the width
    /// ratio, which keeps every block base aligned for the wide read port.
    pub granularity_units: u32,

    /// Write unit width (`MAU`). Default: 8 bits.
    pub mau: Width,

    /// Read word width (`RD_WIDTH`). Default: 32 bits.
    pub rd_width: Width,
}

impl PoolConfig {
    /// Default pool capacity in slots.
    pub const DEFAULT_CAPACITY_UNITS: u32 = 1024;

    /// Default maximum request.
    pub const DEFAULT_MAX_REQUEST_UNITS: u32 = 16;

    /// Default block rounding step.
    pub const DEFAULT_GRANULARITY_UNITS: u32 = 4;

    /// Create a config with the given capacity and default everything else.
    pub fn new(capacity_units: u32) -> Self {
        Self {
            capacity_units,
            max_request_units: Self::DEFAULT_MAX_REQUEST_UNITS,
            granularity_units: Self::DEFAULT_GRANULARITY_UNITS,
            mau: Width::Bits8,
            rd_width: Width::Bits32,
        }
    }

    /// Same config with a different read width.
    pub fn with_rd_width(mut self, rd_width: Width) -> Self {
        self.rd_width = rd_width;
        self
    }

    /// Same config with a different write unit width.
    pub fn with_mau(mut self, mau: Width) -> Self {
        self.mau = mau;
        self
    }

    /// The validated width ratio.
    pub fn ratio(&self) -> Result<Ratio, ConfigError> {
        Ok(Ratio::new(self.mau, self.rd_width)?)
    }

    /// Block-size rules derived from this config.
    pub fn block_sizes(&self) -> BlockSizes {
        BlockSizes::new(self.granularity_units, self.max_request_units)
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. MAU/RD_WIDTH pairing.
        let ratio = self.ratio()?;

        // 2. Granularity: power of two, aligned to the read word.
        let g = self.granularity_units;
        if g == 0 || !g.is_power_of_two() {
            return Err(ConfigError::InvalidGranularity { granularity: g });
        }
        if g % ratio.get() != 0 {
            return Err(ConfigError::GranularityBelowRatio {
                granularity: g,
                ratio: ratio.get(),
            });
        }

        // 3. Max request must be encodable on the request bus.
        if self.max_request_units > SizeRequest::MAX as u32 {
            return Err(ConfigError::MaxRequestOutOfRange {
                configured: self.max_request_units,
            });
        }

        // 4. Capacity holds at least one largest block, in whole blocks.
        let largest = self.block_sizes().largest_block();
        if self.capacity_units < largest {
            return Err(ConfigError::CapacityTooSmall {
                capacity: self.capacity_units,
                largest_block: largest,
            });
        }
        if self.capacity_units % g != 0 {
            return Err(ConfigError::CapacityUnaligned {
                capacity: self.capacity_units,
                granularity: g,
            });
        }

        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY_UNITS)
    }
}

/// Errors detected during [`PoolConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `MAU`/`RD_WIDTH` pairing is invalid.
    Width(RangeError),
    /// Granularity is zero or not a power of two.
    InvalidGranularity {
        /// The configured granularity.
        granularity: u32,
    },
    /// Granularity is not a multiple of the width ratio.
    GranularityBelowRatio {
        /// The configured granularity.
        granularity: u32,
        /// The width ratio it must be a multiple of.
        ratio: u32,
    },
    /// `max_request_units` does not fit the 5-bit request bus.
    MaxRequestOutOfRange {
        /// The configured maximum.
        configured: u32,
    },
    /// Capacity cannot hold a single largest block.
    CapacityTooSmall {
        /// The configured capacity.
        capacity: u32,
        /// The largest block size.
        largest_block: u32,
    },
    /// Capacity is not a whole number of granules.
    CapacityUnaligned {
        /// The configured capacity.
        capacity: u32,
        /// The configured granularity.
        granularity: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Width(e) => write!(f, "width: {e}"),
            Self::InvalidGranularity { granularity } => {
                write!(f, "granularity {granularity} is not a power of two")
            }
            Self::GranularityBelowRatio { granularity, ratio } => {
                write!(
                    f,
                    "granularity {granularity} is not a multiple of width ratio {ratio}"
                )
            }
            Self::MaxRequestOutOfRange { configured } => {
                write!(
                    f,
                    "max_request_units {configured} exceeds request bus maximum {}",
                    SizeRequest::MAX
                )
            }
            Self::CapacityTooSmall {
                capacity,
                largest_block,
            } => {
                write!(
                    f,
                    "capacity {capacity} cannot hold a {largest_block}-unit block"
                )
            }
            Self::CapacityUnaligned {
                capacity,
                granularity,
            } => {
                write!(
                    f,
                    "capacity {capacity} is not a multiple of granularity {granularity}"
                )
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Width(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RangeError> for ConfigError {
    fn from(e: RangeError) -> Self {
        Self::Width(e)
    }
}
