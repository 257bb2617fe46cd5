//! The 5-bit allocation size request.

use std::fmt;

use crate::error::RangeError;

/// Requested block length in storage units, as carried on the 5-bit
/// `request_size` bus.
///
/// Values are range-checked at construction, so a `SizeRequest` always
/// fits the bus. Whether a request is *grantable* is a separate question
/// answered by the allocator's configured maximum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SizeRequest(u8);

impl SizeRequest {
    /// Width of the `request_size` bus in bits.
    pub const BITS: u32 = 5;

    /// Largest encodable request.
    pub const MAX: u8 = (1 << Self::BITS) - 1;

    /// Build a request, rejecting values that do not fit in [`Self::BITS`].
    pub fn new(units: u32) -> Result<Self, RangeError> {
        if units > Self::MAX as u32 {
            return Err(RangeError::SizeRequest { value: units });
        }
        Ok(Self(units as u8))
    }

    /// Build a request from a frame length, clamping to [`Self::MAX`].
    ///
    /// Truncating the high bits would turn a 33-unit frame into a 1-unit
    /// request; clamping keeps an oversize frame oversize so the allocator
    /// rejects it.
    pub fn saturating(units: usize) -> Self {
        Self(units.min(Self::MAX as usize) as u8)
    }

    /// The request in storage units.
    pub fn units(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for SizeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for SizeRequest {
    type Error = RangeError;

    fn try_from(v: u32) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_full_bus_range() {
        assert_eq!(SizeRequest::new(0).unwrap().units(), 0);
        assert_eq!(SizeRequest::new(31).unwrap().units(), 31);
    }

    #[test]
    fn rejects_values_wider_than_bus() {
        assert_eq!(
            SizeRequest::new(32),
            Err(RangeError::SizeRequest { value: 32 })
        );
    }

    #[test]
    fn saturating_clamps_instead_of_wrapping() {
        assert_eq!(SizeRequest::saturating(33).units(), 31);
        assert_eq!(SizeRequest::saturating(14).units(), 14);
    }
}
