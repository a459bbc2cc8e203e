//! # Delay Line Bank (Ring Buffers)
//!
//! A delay line stores audio samples and lets you read them back a fixed
//! number of samples later. Every channel gets its own independent line,
//! but instead of one `Vec` per channel the bank keeps a single
//! contiguous arena and addresses it with a channel stride:
//!
//! ```text
//! arena: [ ch0: capacity samples | ch1: capacity samples | ... ]
//!          ▲ write_pos[0]          ▲ write_pos[1]
//! ```
//!
//! Each channel still behaves like a circular tape loop. Per frame:
//!
//! 1. Read one or more past samples at `(write_pos + capacity - offset) % capacity`.
//! 2. Write the new sample at `write_pos`.
//! 3. Advance `write_pos` by 1, wrapping back to 0 at `capacity`.
//!
//! Unlike a modulated delay, every read here lands on a whole sample, so
//! there is no interpolation. The delay time only changes at block
//! boundaries.

use std::num::NonZeroUsize;

/// The longest delay any channel can hold, in seconds.
pub const MAX_DELAY_SECONDS: f64 = 3.0;

/// One fixed-capacity ring buffer per channel, stored back to back.
///
/// All memory is allocated in [`initialize()`](Self::initialize), which
/// runs off the render thread. Reads, writes and cursor advances never
/// allocate.
#[derive(Debug, Default)]
pub struct DelayLineBank {
    /// `channel_count * capacity` samples, zero-initialized.
    samples: Vec<f32>,

    /// Write cursor per channel, each in `[0, capacity)`.
    write_pos: Vec<usize>,

    /// Samples per channel. Zero until the bank is initialized.
    capacity: usize,
}

impl DelayLineBank {
    /// Number of samples needed to hold [`MAX_DELAY_SECONDS`] at
    /// `sample_rate`, rounded down.
    ///
    /// Returns `None` when the result would be zero (including for
    /// negative, zero or NaN sample rates).
    pub fn capacity_for(sample_rate: f64) -> Option<NonZeroUsize> {
        // `as` saturates: NaN and negative values become 0.
        NonZeroUsize::new((sample_rate * MAX_DELAY_SECONDS) as usize)
    }

    /// (Re)allocate `channel_count` silent lines of `capacity` samples
    /// each and rewind every write cursor to 0.
    pub fn initialize(&mut self, channel_count: usize, capacity: NonZeroUsize) {
        self.capacity = capacity.get();
        self.samples.clear();
        self.samples.resize(channel_count * self.capacity, 0.0);
        self.write_pos.clear();
        self.write_pos.resize(channel_count, 0);
    }

    /// Number of channels the bank was initialized for.
    pub fn channel_count(&self) -> usize {
        self.write_pos.len()
    }

    /// Samples per channel.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `true` before the first successful [`initialize()`](Self::initialize).
    pub fn is_empty(&self) -> bool {
        self.capacity == 0
    }

    /// Current write cursor of `channel`.
    pub fn write_index(&self, channel: usize) -> usize {
        self.write_pos[channel]
    }

    /// Read the sample written `offset` frames ago on `channel`.
    ///
    /// `offset` must lie in `[1, capacity]`. An offset of `capacity`
    /// returns the oldest sample still held, which is the slot about to be
    /// overwritten.
    #[inline]
    pub fn read(&self, channel: usize, offset: usize) -> f32 {
        debug_assert!(
            (1..=self.capacity).contains(&offset),
            "delay offset {offset} outside [1, {}]",
            self.capacity
        );

        let index = (self.write_pos[channel] + self.capacity - offset) % self.capacity;
        self.samples[channel * self.capacity + index]
    }

    /// Store `sample` at `channel`'s current write position.
    ///
    /// This does NOT move the cursor. Call [`advance()`](Self::advance)
    /// once all reads and the write for this frame are done.
    #[inline]
    pub fn write(&mut self, channel: usize, sample: f32) {
        let index = channel * self.capacity + self.write_pos[channel];
        self.samples[index] = sample;
    }

    /// Move `channel`'s write cursor one sample forward, wrapping at
    /// `capacity`.
    #[inline]
    pub fn advance(&mut self, channel: usize) {
        let pos = &mut self.write_pos[channel];
        *pos = (*pos + 1) % self.capacity;
    }

    /// Silence every line and rewind every cursor, keeping the allocation.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
        self.write_pos.fill(0);
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
