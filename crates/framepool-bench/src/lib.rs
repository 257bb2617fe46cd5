//! Benchmark profiles for the framepool allocator and storage engine.
//!
//! - [`reference_pool`]: the default 1024-slot pool at a chosen read width
//! - [`churn_sizes`]: a deterministic request-size sequence for allocator churn
//! - [`reference_engine`]: a free-running engine config

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use framepool_arena::PoolConfig;
use framepool_core::{SizeRequest, Width};
use framepool_engine::EngineConfig;

/// Slots in the reference pool.
pub const REFERENCE_CAPACITY: u32 = 1024;

/// Default pool (8-bit writes, 16-unit maximum) reading at `rd_width`.
pub fn reference_pool(rd_width: Width) -> PoolConfig {
    PoolConfig::new(REFERENCE_CAPACITY).with_rd_width(rd_width)
}

/// `n` grantable request sizes, cycling through `1..=16` with a stride
/// that avoids repeating the same size back to back.
pub fn churn_sizes(n: usize) -> Vec<SizeRequest> {
    (0..n)
        .map(|i| SizeRequest::saturating(1 + (i * 7) % 16))
        .collect()
}

/// Free-running engine over [`reference_pool`] with a deep ingress queue.
pub fn reference_engine(rd_width: Width) -> EngineConfig {
    let mut config = EngineConfig::new(reference_pool(rd_width));
    config.ingress_capacity = 1024;
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_are_valid() {
        for w in [Width::Bits8, Width::Bits32, Width::Bits64] {
            assert!(reference_pool(w).validate().is_ok());
            assert!(reference_engine(w).validate().is_ok());
        }
    }

    #[test]
    fn churn_sizes_stay_in_range() {
        let sizes = churn_sizes(64);
        assert!(sizes.iter().all(|s| (1..=16).contains(&s.units())));
        assert!(sizes.windows(2).all(|w| w[0] != w[1]));
    }
}
