//! # DSP Primitives
//!
//! The building blocks the render kernel is assembled from:
//!
//! - **`delay_line`**: one ring buffer per channel, stored in a single
//!   contiguous arena. Both delay algorithms read and write through it.
//!
//! - **`oscillator`**: the sine LFO and linear pan law that bounce the
//!   wet signal between left and right in ping-pong mode.

pub mod delay_line;
pub mod oscillator;
