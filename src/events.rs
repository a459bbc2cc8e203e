//! Timestamped render events and the host's musical-context capability.
//!
//! Neither affects the sound today. Parameter events are accepted by the
//! kernel and dropped (values reach the kernel through the
//! [`ParameterStore`](crate::parameters::ParameterStore) instead), and the
//! musical context is stored but never queried.

/// Sample position in the host's timeline.
pub type SampleTime = i64;

/// A parameter change scheduled by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterEvent {
    /// Sample time at which the change should land.
    pub event_sample_time: SampleTime,
    /// Raw host address, see [`ParameterAddress`](crate::parameters::ParameterAddress).
    pub address: u64,
    /// Target value in host units.
    pub value: f32,
    /// Requested ramp length in samples. Zero means an immediate jump.
    pub ramp_duration_samples: u32,
}

/// An event delivered to the kernel alongside a render block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderEvent {
    Parameter(ParameterEvent),
    /// Any tag the kernel does not understand (MIDI, SysEx, ...).
    Other,
}

/// Tempo and meter as supplied by the host.
///
/// The kernel stores one if the host offers it. Rendering never calls
/// into it.
pub trait MusicalContext {
    /// Current tempo in beats per minute.
    fn tempo(&self) -> Option<f64>;

    /// `(beats per measure, note value of one beat)`.
    fn time_signature(&self) -> Option<(f64, i64)>;
}
