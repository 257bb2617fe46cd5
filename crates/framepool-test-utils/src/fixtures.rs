//! Payload generators.
//!
//! - [`ramp_payload`]: `0, 1, 2, ...`, the pattern the scenario tests use.
//! - [`seeded_payload`]: reproducible pseudo-random units masked to a
//!   write width.

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use framepool_core::Width;

/// `n` units counting up from zero.
pub fn ramp_payload(n: usize) -> Vec<u64> {
    (0..n as u64).collect()
}

/// `n` pseudo-random units, each masked to `mau` bits.
///
/// The same `seed` always gives the same payload.
pub fn seeded_payload(seed: u64, n: usize, mau: Width) -> Vec<u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mask = mau.mask();
    (0..n).map(|_| rng.next_u64() & mask).collect()
}
