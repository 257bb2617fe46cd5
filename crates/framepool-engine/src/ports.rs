//! Clocked write and read ports.
//!
//! These drive the arena's [`WritePort`] and [`ReadPort`] one access per
//! edge. The write side is a plain per-cycle store; the read side keeps
//! a burst cursor so that holding `rd_en` streams consecutive words.

use tracing::trace;

use framepool_arena::{Allocation, ReadPort, WritePort};
use framepool_core::{Addr, ReadInputs, ReadOutputs, StorageError, WriteInputs};

use crate::clock::Clock;

/// Write port clocked by the write domain.
pub struct ClockedWritePort {
    port: WritePort,
    units_written: u64,
}

impl ClockedWritePort {
    /// Wrap a write port.
    pub fn new(port: WritePort) -> Self {
        Self {
            port,
            units_written: 0,
        }
    }

    /// Sample one edge: store `data` at `addr` when `enable` is set.
    pub fn clock(&mut self, inputs: WriteInputs) -> Result<(), StorageError> {
        if inputs.enable {
            self.port.write(inputs.addr, inputs.data)?;
            self.units_written += 1;
        }
        Ok(())
    }

    /// Write `units` into `allocation`, one unit per edge of `clock`.
    ///
    /// Stops with [`StorageError::BlockOverrun`] before writing past the
    /// requested length; units written up to that point stay written.
    pub fn write_frame(
        &mut self,
        allocation: Allocation,
        units: &[u64],
        clock: &mut Clock,
    ) -> Result<(), StorageError> {
        let mut writer = self.port.block(allocation);
        for &unit in units {
            clock.edge();
            writer.push(unit)?;
            self.units_written += 1;
        }
        trace!(addr = %allocation.addr(), units = writer.written(), "frame written");
        Ok(())
    }

    /// Units stored since construction.
    pub fn units_written(&self) -> u64 {
        self.units_written
    }

    /// The underlying port.
    pub fn port(&self) -> &WritePort {
        &self.port
    }
}

/// Read port clocked by the read domain.
///
/// The first enabled edge latches `i_addr`; each following enabled edge
/// advances the cursor by `RATIO`. Deasserting `rd_en` ends the burst.
pub struct ClockedReadPort {
    port: ReadPort,
    cursor: Option<Addr>,
    words_read: u64,
}

impl ClockedReadPort {
    /// Wrap a read port.
    pub fn new(port: ReadPort) -> Self {
        Self {
            port,
            cursor: None,
            words_read: 0,
        }
    }

    /// Sample one edge.
    pub fn clock(&mut self, inputs: ReadInputs) -> Result<ReadOutputs, StorageError> {
        if !inputs.enable {
            self.cursor = None;
            return Ok(ReadOutputs::default());
        }
        let addr = self.cursor.unwrap_or(inputs.addr);
        let data = self.port.read_word(addr)?;
        self.cursor = Some(addr.offset(self.port.ratio().get()));
        self.words_read += 1;
        Ok(ReadOutputs { data, valid: true })
    }

    /// Read the `ceil(N / RATIO)` words covering `allocation`, one per
    /// edge of `clock`, then end the burst.
    ///
    /// Always starts at the allocation's base, closing any burst left open
    /// by [`clock()`](Self::clock). The burst is closed on return, whether
    /// or not every word was read.
    pub fn burst(
        &mut self,
        allocation: &Allocation,
        clock: &mut Clock,
    ) -> Result<Vec<u64>, StorageError> {
        let words = self.port.ratio().words_for(allocation.len() as usize);
        self.cursor = None;
        let out: Result<Vec<u64>, StorageError> = (0..words)
            .map(|_| {
                clock.edge();
                self.clock(ReadInputs::read(allocation.addr()))
                    .map(|o| o.data)
            })
            .collect();
        self.cursor = None;
        out
    }

    /// Words produced since construction.
    pub fn words_read(&self) -> u64 {
        self.words_read
    }

    /// The underlying port.
    pub fn port(&self) -> &ReadPort {
        &self.port
    }
}
