//! Request validation and block-size rounding.
//!
//! Every granted block is a whole number of granules, from one granule up
//! to the granule-rounded maximum request. With the defaults (granule 4,
//! max request 16) the supported set is `{4, 8, 12, 16}`.

use framepool_core::{AllocError, SizeRequest};

/// The supported block-size set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockSizes {
    granularity: u32,
    max_request: u32,
}

impl BlockSizes {
    /// Create the size set for a granule size and inclusive maximum request.
    ///
    /// # Panics
    ///
    /// Panics if `granularity` is zero. [`PoolConfig::validate()`]
    /// rejects that before a `BlockSizes` is built from config.
    ///
    /// [`PoolConfig::validate()`]: crate::PoolConfig::validate
    pub fn new(granularity: u32, max_request: u32) -> Self {
        assert!(granularity > 0, "granularity must be at least 1");
        Self {
            granularity,
            max_request,
        }
    }

    /// Granule size in units.
    pub fn granularity(&self) -> u32 {
        self.granularity
    }

    /// Largest grantable request, inclusive.
    pub fn max_request(&self) -> u32 {
        self.max_request
    }

    /// Smallest block the allocator hands out.
    pub fn smallest_block(&self) -> u32 {
        self.granularity
    }

    /// Largest block the allocator hands out.
    pub fn largest_block(&self) -> u32 {
        self.round_up(self.max_request)
    }

    /// Validate a request and return the block size it occupies.
    ///
    /// A zero-unit request is within bound and occupies the smallest block.
    pub fn resolve(&self, request: SizeRequest) -> Result<u32, AllocError> {
        let units = request.units();
        if units > self.max_request {
            return Err(AllocError::RequestTooLarge {
                requested: units,
                max: self.max_request,
            });
        }
        Ok(self.round_up(units))
    }

    /// Whether `units` is a member of the supported set.
    pub fn contains(&self, units: u32) -> bool {
        units >= self.smallest_block()
            && units <= self.largest_block()
            && units % self.granularity == 0
    }

    /// All supported block sizes, smallest first.
    pub fn classes(&self) -> impl Iterator<Item = u32> + '_ {
        (1..=self.largest_block() / self.granularity).map(move |n| n * self.granularity)
    }

    fn round_up(&self, units: u32) -> u32 {
        units.max(1).div_ceil(self.granularity) * self.granularity
    }
}
