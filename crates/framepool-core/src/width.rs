//! Port widths and the write-to-read width ratio.
//!
//! The write port moves one MAU-wide unit per cycle; the read port moves
//! one `RD_WIDTH`-wide word per cycle. When `RD_WIDTH = RATIO * MAU`, each
//! read word packs `RATIO` consecutive write units.
//!
//! # Packing order
//!
//! Little-endian by address: the unit at the lowest address occupies the
//! least significant MAU bits of the word.
//!
//! ```text
//! MAU = 8, RD_WIDTH = 32, RATIO = 4
//!
//! slot:   a+0   a+1   a+2   a+3
//! unit:   0x00  0x01  0x02  0x03
//! word:   0x03_02_01_00
//! ```

use std::fmt;

use smallvec::SmallVec;

use crate::error::RangeError;

/// Transfer width of a port, in bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Width {
    /// 8-bit transfers.
    Bits8,
    /// 16-bit transfers.
    Bits16,
    /// 32-bit transfers.
    Bits32,
    /// 64-bit transfers. Valid for the read port only.
    Bits64,
}

impl Width {
    /// Parse a width from a bit count.
    pub fn from_bits(bits: u32) -> Result<Self, RangeError> {
        match bits {
            8 => Ok(Self::Bits8),
            16 => Ok(Self::Bits16),
            32 => Ok(Self::Bits32),
            64 => Ok(Self::Bits64),
            _ => Err(RangeError::Width { bits }),
        }
    }

    /// Width in bits.
    pub fn bits(self) -> u32 {
        match self {
            Self::Bits8 => 8,
            Self::Bits16 => 16,
            Self::Bits32 => 32,
            Self::Bits64 => 64,
        }
    }

    /// Mask selecting the low `bits()` bits of a `u64`.
    pub fn mask(self) -> u64 {
        match self {
            Self::Bits64 => u64::MAX,
            w => (1u64 << w.bits()) - 1,
        }
    }

    /// Whether `value` fits in this width without truncation.
    pub fn fits(self, value: u64) -> bool {
        value & !self.mask() == 0
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}b", self.bits())
    }
}

impl TryFrom<u32> for Width {
    type Error = RangeError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        Self::from_bits(bits)
    }
}

/// Validated pairing of write unit width (`MAU`) and read width
/// (`RD_WIDTH`).
///
/// Construction guarantees `MAU <= 32` bits and that `RD_WIDTH` is a whole
/// multiple of `MAU`, so [`get()`](Ratio::get) is always at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ratio {
    mau: Width,
    rd_width: Width,
}

impl Ratio {
    /// Pair a write unit width with a read width.
    pub fn new(mau: Width, rd_width: Width) -> Result<Self, RangeError> {
        let valid = mau != Width::Bits64
            && rd_width.bits() >= mau.bits()
            && rd_width.bits() % mau.bits() == 0;
        if !valid {
            return Err(RangeError::Ratio { mau, rd_width });
        }
        Ok(Self { mau, rd_width })
    }

    /// Write units per read word (`RD_WIDTH / MAU`).
    pub fn get(self) -> u32 {
        self.rd_width.bits() / self.mau.bits()
    }

    /// The write unit width.
    pub fn mau(self) -> Width {
        self.mau
    }

    /// The read word width.
    pub fn rd_width(self) -> Width {
        self.rd_width
    }

    /// Read words needed to cover `units` write units (`ceil(units / RATIO)`).
    pub fn words_for(self, units: usize) -> usize {
        units.div_ceil(self.get() as usize)
    }

    /// Pack up to `RATIO` units into one read word, lowest address first.
    ///
    /// Units beyond `RATIO` are ignored; each unit is masked to `MAU` bits.
    pub fn pack<I>(self, units: I) -> u64
    where
        I: IntoIterator<Item = u64>,
    {
        let bits = self.mau.bits();
        let mask = self.mau.mask();
        units
            .into_iter()
            .take(self.get() as usize)
            .enumerate()
            .fold(0u64, |word, (i, unit)| {
                word | ((unit & mask) << (i as u32 * bits))
            })
    }

    /// Split one read word back into `RATIO` units, lowest address first.
    pub fn split(self, word: u64) -> SmallVec<[u64; 8]> {
        let bits = self.mau.bits();
        let mask = self.mau.mask();
        (0..self.get())
            .map(|i| (word >> (i * bits)) & mask)
            .collect()
    }

    /// Split a run of read words and keep the first `units` write units.
    ///
    /// The tail of the last word past `units` is padding and is dropped.
    pub fn reassemble(self, words: &[u64], units: usize) -> Vec<u64> {
        let mut out = Vec::with_capacity(words.len() * self.get() as usize);
        for &word in words {
            out.extend(self.split(word));
        }
        out.truncate(units);
        out
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} (x{})", self.mau, self.rd_width, self.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(mau: u32, rd: u32) -> Ratio {
        Ratio::new(Width::from_bits(mau).unwrap(), Width::from_bits(rd).unwrap()).unwrap()
    }

    #[test]
    fn width_from_bits() {
        assert_eq!(Width::from_bits(8), Ok(Width::Bits8));
        assert_eq!(Width::from_bits(32), Ok(Width::Bits32));
        assert_eq!(Width::from_bits(12), Err(RangeError::Width { bits: 12 }));
    }

    #[test]
    fn width_fits() {
        assert!(Width::Bits8.fits(0xff));
        assert!(!Width::Bits8.fits(0x100));
        assert!(Width::Bits64.fits(u64::MAX));
    }

    #[test]
    fn ratio_values() {
        assert_eq!(ratio(8, 8).get(), 1);
        assert_eq!(ratio(8, 32).get(), 4);
        assert_eq!(ratio(16, 64).get(), 4);
    }

    #[test]
    fn ratio_rejects_narrow_read() {
        let err = Ratio::new(Width::Bits32, Width::Bits8).unwrap_err();
        assert!(matches!(err, RangeError::Ratio { .. }));
    }

    #[test]
    fn ratio_rejects_64_bit_mau() {
        assert!(Ratio::new(Width::Bits64, Width::Bits64).is_err());
    }

    #[test]
    fn words_for_rounds_up() {
        let r = ratio(8, 32);
        assert_eq!(r.words_for(0), 0);
        assert_eq!(r.words_for(1), 1);
        assert_eq!(r.words_for(4), 1);
        assert_eq!(r.words_for(14), 4);
        assert_eq!(r.words_for(16), 4);
    }

    #[test]
    fn pack_is_lowest_address_first() {
        let r = ratio(8, 32);
        assert_eq!(r.pack([0x00, 0x01, 0x02, 0x03]), 0x0302_0100);
    }

    #[test]
    fn pack_masks_and_ignores_extra_units() {
        let r = ratio(8, 16);
        assert_eq!(r.pack([0x1ff, 0x02, 0x77]), 0x02ff);
    }

    #[test]
    fn split_inverts_pack() {
        let r = ratio(8, 32);
        let units: Vec<u64> = r.split(0xdead_beef).into_iter().collect();
        assert_eq!(units, vec![0xef, 0xbe, 0xad, 0xde]);
    }

    #[test]
    fn reassemble_truncates_padding() {
        let r = ratio(8, 32);
        let words = [0x0302_0100, 0xaaaa_0504];
        assert_eq!(r.reassemble(&words, 6), vec![0, 1, 2, 3, 4, 5]);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn reassemble_reproduces_units(
                units in proptest::collection::vec(0u64..256, 0..40),
                rd in prop_oneof![Just(8u32), Just(16), Just(32), Just(64)],
            ) {
                let r = ratio(8, rd);
                let words: Vec<u64> = units
                    .chunks(r.get() as usize)
                    .map(|chunk| r.pack(chunk.iter().copied()))
                    .collect();
                prop_assert_eq!(words.len(), r.words_for(units.len()));
                prop_assert_eq!(r.reassemble(&words, units.len()), units);
            }
        }
    }
}
