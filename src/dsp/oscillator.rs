//! # Ping-Pong Modulation Oscillator
//!
//! A sine LFO that swings the wet signal between the left and right
//! channels. It is a bare phase accumulator:
//!
//! ```text
//! pan       = sin(phase)                      // read first
//! phase    += 2π * frequency / sample_rate    // then advance
//! ```
//!
//! The increment is recomputed every frame from the live frequency, so a
//! rate change is heard immediately rather than on the next block.
//!
//! ## Pan Law
//!
//! The pan value is mapped to gains with a *linear* law:
//!
//! ```text
//! left  = (1 - pan) / 2
//! right = (1 + pan) / 2
//! ```
//!
//! The two gains always sum to 1. This is not equal-power panning, so the
//! wet signal dips by about 3 dB when it sits in the center.

use std::f32::consts::TAU;

/// Per-side wet gain for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanGains {
    pub left: f32,
    pub right: f32,
}

impl PanGains {
    /// Linear pan law for a pan value in `[-1, 1]`.
    #[inline]
    pub fn from_pan(pan: f32) -> Self {
        Self {
            left: (1.0 - pan) * 0.5,
            right: (1.0 + pan) * 0.5,
        }
    }

    /// Gain for `channel`: channel 0 is left, every other channel is right.
    #[inline]
    pub fn for_channel(&self, channel: usize) -> f32 {
        if channel == 0 {
            self.left
        } else {
            self.right
        }
    }
}

/// Shared phase accumulator for all channels.
#[derive(Debug, Default)]
pub struct ModulationOscillator {
    /// Current phase in radians, kept in `[0, 2π)`.
    phase: f32,
}

impl ModulationOscillator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase advance per frame for `frequency_hz` at `sample_rate`.
    /// Negative frequencies run the oscillator backwards.
    #[inline]
    pub fn phase_increment(frequency_hz: f32, sample_rate: f32) -> f32 {
        TAU * frequency_hz / sample_rate
    }

    /// `sin(phase)`, in `[-1, 1]`.
    #[inline]
    pub fn current_pan(&self) -> f32 {
        self.phase.sin()
    }

    /// Step the phase by `increment`, wrapping once into `[0, 2π)`.
    #[inline]
    pub fn advance(&mut self, increment: f32) {
        self.phase += increment;
        if self.phase >= TAU {
            self.phase -= TAU;
        } else if self.phase < 0.0 {
            self.phase += TAU;
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
