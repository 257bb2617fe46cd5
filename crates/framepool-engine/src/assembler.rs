//! Stream-to-frame assembly.
//!
//! The decode pipeline hands over a byte stream as
//! `decode_valid`/`decode_din`/`decode_done` beats. [`FrameAssembler`]
//! collects them into [`Frame`]s, one per `decode_done`.

use framepool_core::SizeRequest;

/// One beat of the decoder's output handshake.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamBeat {
    /// `decode_valid`: `data` carries a unit this cycle.
    pub valid: bool,
    /// `decode_din`: one MAU-wide unit.
    pub data: u64,
    /// `decode_done`: this beat ends the frame.
    pub last: bool,
}

impl StreamBeat {
    /// A data beat.
    pub fn data(data: u64) -> Self {
        Self {
            valid: true,
            data,
            last: false,
        }
    }

    /// The final data beat of a frame.
    pub fn last(data: u64) -> Self {
        Self {
            valid: true,
            data,
            last: true,
        }
    }

    /// A bubble.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Beats for a whole frame, with `last` on the final one.
    pub fn frame(units: &[u64]) -> Vec<StreamBeat> {
        let n = units.len();
        units
            .iter()
            .enumerate()
            .map(|(i, &d)| if i + 1 == n { Self::last(d) } else { Self::data(d) })
            .collect()
    }
}

/// One decoded payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    units: Vec<u64>,
    len: usize,
}

impl Frame {
    /// A frame holding exactly `units`.
    pub fn new(units: Vec<u64>) -> Self {
        let len = units.len();
        Self { units, len }
    }

    /// Units kept for this frame.
    pub fn units(&self) -> &[u64] {
        &self.units
    }

    /// Take the units out.
    pub fn into_units(self) -> Vec<u64> {
        self.units
    }

    /// Length of the frame as seen on the wire, including any units the
    /// assembler discarded.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the frame carried no data.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether units were discarded because the frame outgrew the
    /// assembler's buffer.
    pub fn is_truncated(&self) -> bool {
        self.units.len() < self.len
    }

    /// The request to strobe for this frame.
    ///
    /// Oversize lengths clamp to the largest encodable request so the
    /// allocator rejects them instead of seeing a wrapped small value.
    pub fn size_request(&self) -> SizeRequest {
        SizeRequest::saturating(self.len)
    }
}

/// Collects stream beats into frames.
#[derive(Debug)]
pub struct FrameAssembler {
    max_units: usize,
    units: Vec<u64>,
    len: usize,
}

impl FrameAssembler {
    /// Default buffer limit in units.
    pub const DEFAULT_MAX_UNITS: usize = 64;

    /// An assembler that keeps at most `max_units` units per frame.
    pub fn new(max_units: usize) -> Self {
        Self {
            max_units,
            units: Vec::with_capacity(max_units),
            len: 0,
        }
    }

    /// Sample one beat. Returns a frame on the beat that ends it.
    pub fn push(&mut self, beat: StreamBeat) -> Option<Frame> {
        if beat.valid {
            if self.units.len() < self.max_units {
                self.units.push(beat.data);
            }
            self.len += 1;
        }
        if !beat.last {
            return None;
        }
        let units = std::mem::replace(&mut self.units, Vec::with_capacity(self.max_units));
        let len = std::mem::take(&mut self.len);
        Some(Frame { units, len })
    }

    /// Units collected for the frame in progress.
    pub fn pending(&self) -> usize {
        self.len
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_UNITS)
    }
}
