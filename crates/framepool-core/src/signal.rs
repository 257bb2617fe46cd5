//! Per-cycle signal bundles.
//!
//! Each struct is the set of wires sampled or driven on one clock edge.
//! Names follow the port list: `alloc_en`/`request_size` in,
//! `o_addr`/`o_valid`/`o_err` out; `wr_en`/`i_addr`/`wr_data` on the
//! write port; `rd_en`/`i_addr` in and `o_rd_data` out on the read port.

use crate::id::Addr;
use crate::size::SizeRequest;

/// Allocator inputs for one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocInputs {
    /// `alloc_en`: request strobe, sampled on the edge.
    pub enable: bool,
    /// `request_size`: block length in storage units.
    pub request_size: SizeRequest,
}

impl AllocInputs {
    /// No request this cycle.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Strobe a request for `request_size` units.
    pub fn strobe(request_size: SizeRequest) -> Self {
        Self {
            enable: true,
            request_size,
        }
    }
}

/// Allocator outputs after one cycle.
///
/// `valid` is a one-cycle pulse; `addr` and `err` hold their value from
/// the most recent pulse until the next one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocOutputs {
    /// `o_addr`: granted base address. Meaningless when `err` is set.
    pub addr: Addr,
    /// `o_valid`: response pulse.
    pub valid: bool,
    /// `o_err`: the request was rejected.
    pub err: bool,
}

impl AllocOutputs {
    /// The granted address, if this cycle carries a successful response.
    pub fn granted(&self) -> Option<Addr> {
        (self.valid && !self.err).then_some(self.addr)
    }

    /// Whether this cycle carries a rejection.
    pub fn rejected(&self) -> bool {
        self.valid && self.err
    }
}

/// Write port inputs for one write-clock cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteInputs {
    /// `wr_en`: write this cycle.
    pub enable: bool,
    /// `i_addr`: slot to write; the caller advances it each cycle.
    pub addr: Addr,
    /// `wr_data`: one MAU-wide unit.
    pub data: u64,
}

impl WriteInputs {
    /// No write this cycle.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Write `data` at `addr`.
    pub fn write(addr: Addr, data: u64) -> Self {
        Self {
            enable: true,
            addr,
            data,
        }
    }
}

/// Read port inputs for one read-clock cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadInputs {
    /// `rd_en`: read this cycle.
    pub enable: bool,
    /// `i_addr`: burst start address, latched on the first enabled cycle.
    pub addr: Addr,
}

impl ReadInputs {
    /// No read this cycle.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Read (or continue a burst) starting at `addr`.
    pub fn read(addr: Addr) -> Self {
        Self { enable: true, addr }
    }
}

/// Read port outputs after one read-clock cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadOutputs {
    /// `o_rd_data`: one `RD_WIDTH`-wide word.
    pub data: u64,
    /// Set when `data` was produced this cycle.
    pub valid: bool,
}
