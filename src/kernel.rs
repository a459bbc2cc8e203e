//! # Render Kernel
//!
//! Everything that runs on the audio thread. The kernel owns the delay
//! lines and the ping-pong oscillator, reads the shared
//! [`ParameterStore`] once per block, and renders input into output.
//!
//! ## Signal Flow (per frame, per channel)
//!
//! ```text
//!                  Standard                          Zeno
//!                  ────────                          ────
//! delayed  = line[-d]                    delayed = Σ line[-d/2^k] * 0.9 * 0.5^k
//! line[0]  = in + delayed * feedback     line[0] = clamp(in + delayed * 0.5, -1, 1)
//!
//! out = in * dry + delayed * wet * pan_gain
//! ```
//!
//! `d` is the base delay in samples, fixed for the whole block. The Zeno
//! sum keeps halving `d` (integer division) until it reaches zero, which
//! stacks ever-closer, ever-quieter echoes that converge on the dry
//! signal. It uses its own fixed feedback of 0.5; the feedback control
//! only drives the standard algorithm.
//!
//! `pan_gain` is the linear ping-pong gain for the channel when ping-pong
//! is on and there are at least two channels, and 1.0 otherwise.

use std::sync::Arc;

use nih_plug::{nih_debug_assert, nih_debug_assert_eq};
use thiserror::Error;

use crate::dsp::delay_line::DelayLineBank;
use crate::dsp::oscillator::{ModulationOscillator, PanGains};
use crate::events::{MusicalContext, ParameterEvent, RenderEvent, SampleTime};
use crate::parameters::{ParameterAddress, ParameterStore};

/// Fixed feedback coefficient of the Zeno algorithm. Each tap is also
/// this much quieter than the one before it.
pub const ZENO_FEEDBACK: f32 = 0.5;

/// Gain of the first (longest) Zeno tap.
pub const ZENO_FIRST_TAP_GAIN: f32 = 0.9;

/// Advertised block size until the host says otherwise.
pub const DEFAULT_MAX_FRAMES_TO_RENDER: u32 = 1024;

/// Why [`DelayKernel::initialize()`] refused a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum KernelError {
    #[error("input has {input} channels but output has {output}; layouts must be symmetric")]
    ChannelMismatch { input: usize, output: usize },

    #[error("sample rate {0} Hz cannot hold a delay line")]
    InvalidSampleRate(f64),
}

/// The delay effect's render engine.
pub struct DelayKernel {
    /// Shared with whoever sets parameters from the control side.
    params: Arc<ParameterStore>,

    sample_rate: f64,

    delay_lines: DelayLineBank,

    oscillator: ModulationOscillator,

    bypassed: bool,

    /// Advisory only. Checked in debug builds, never enforced.
    max_frames_to_render: u32,

    musical_context: Option<Box<dyn MusicalContext + Send>>,
}

impl Default for DelayKernel {
    fn default() -> Self {
        Self::with_parameters(Arc::new(ParameterStore::new()))
    }
}

impl DelayKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A kernel that reads its controls from an existing store.
    pub fn with_parameters(params: Arc<ParameterStore>) -> Self {
        Self {
            params,
            // Placeholder until initialize().
            sample_rate: 44100.0,
            delay_lines: DelayLineBank::default(),
            oscillator: ModulationOscillator::new(),
            bypassed: false,
            max_frames_to_render: DEFAULT_MAX_FRAMES_TO_RENDER,
            musical_context: None,
        }
    }

    /// Allocate one silent 3-second delay line per channel.
    ///
    /// Call this off the render thread, before the first
    /// [`process()`](Self::process) and whenever the sample rate or channel
    /// layout changes. The oscillator phase is left where it was.
    pub fn initialize(
        &mut self,
        input_channels: usize,
        output_channels: usize,
        sample_rate: f64,
    ) -> Result<(), KernelError> {
        if input_channels != output_channels {
            return Err(KernelError::ChannelMismatch {
                input: input_channels,
                output: output_channels,
            });
        }
        if !sample_rate.is_finite() {
            return Err(KernelError::InvalidSampleRate(sample_rate));
        }
        let capacity = DelayLineBank::capacity_for(sample_rate)
            .ok_or(KernelError::InvalidSampleRate(sample_rate))?;

        self.sample_rate = sample_rate;
        self.delay_lines.initialize(input_channels, capacity);

        Ok(())
    }

    /// Nothing to release; the buffers are dropped with the kernel.
    pub fn de_initialize(&mut self) {}

    /// Silence the delay lines and recenter the oscillator without
    /// reallocating.
    pub fn reset(&mut self) {
        self.delay_lines.clear();
        self.oscillator.reset();
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Samples per channel line. Zero before initialization.
    pub fn delay_capacity(&self) -> usize {
        self.delay_lines.capacity()
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    pub fn set_bypass(&mut self, should_bypass: bool) {
        self.bypassed = should_bypass;
    }

    pub fn maximum_frames_to_render(&self) -> u32 {
        self.max_frames_to_render
    }

    pub fn set_maximum_frames_to_render(&mut self, max_frames: u32) {
        self.max_frames_to_render = max_frames;
    }

    pub fn parameter_store(&self) -> &ParameterStore {
        &self.params
    }

    /// Handle to the store, for handing to a control thread.
    pub fn parameters(&self) -> Arc<ParameterStore> {
        Arc::clone(&self.params)
    }

    pub fn set_parameter(&self, address: ParameterAddress, value: f32) {
        self.params.set(address, value);
    }

    /// The target value in host units. There is no ramp, so this is also
    /// the value the next block will render with.
    pub fn get_parameter(&self, address: ParameterAddress) -> f32 {
        self.params.get(address)
    }

    pub fn set_musical_context(&mut self, context: Box<dyn MusicalContext + Send>) {
        self.musical_context = Some(context);
    }

    pub fn has_musical_context(&self) -> bool {
        self.musical_context.is_some()
    }

    /// `time_interval` seconds as a whole-sample delay, rounded and kept
    /// within `[1, capacity - 1]`.
    pub fn base_delay_samples(&self, time_interval: f64) -> usize {
        let max_delay = self.delay_lines.capacity().saturating_sub(1).max(1);
        // `as` saturates: negative and NaN delays become 0, then 1.
        ((time_interval * self.sample_rate).round() as usize).clamp(1, max_delay)
    }

    /// Route one host event. Parameter events are accepted and ignored;
    /// everything else is dropped.
    pub fn handle_event(&mut self, now: SampleTime, event: &RenderEvent) {
        match event {
            RenderEvent::Parameter(parameter_event) => {
                self.handle_parameter_event(now, parameter_event)
            }
            RenderEvent::Other => {}
        }
    }

    fn handle_parameter_event(&mut self, _now: SampleTime, _event: &ParameterEvent) {}

    /// Render `frame_count` frames from `inputs` into `outputs`.
    ///
    /// Preconditions (checked in debug builds only):
    /// - `inputs.len() == outputs.len()`, and both match the channel count
    ///   passed to [`initialize()`](Self::initialize)
    /// - `frame_count <= maximum_frames_to_render()`
    /// - every channel slice holds at least `frame_count` samples
    ///
    /// Never allocates or blocks.
    pub fn process<I, O>(
        &mut self,
        inputs: &[I],
        outputs: &mut [O],
        _block_start: SampleTime,
        frame_count: usize,
    ) where
        I: AsRef<[f32]>,
        O: AsMut<[f32]>,
    {
        nih_debug_assert_eq!(inputs.len(), outputs.len());
        nih_debug_assert!(frame_count <= self.max_frames_to_render as usize);

        if self.bypassed {
            for (input, output) in inputs.iter().zip(outputs.iter_mut()) {
                output.as_mut()[..frame_count].copy_from_slice(&input.as_ref()[..frame_count]);
            }
            return;
        }

        if self.delay_lines.is_empty() {
            for output in outputs.iter_mut() {
                output.as_mut()[..frame_count].fill(0.0);
            }
            return;
        }

        nih_debug_assert_eq!(inputs.len(), self.delay_lines.channel_count());
        let num_channels = inputs
            .len()
            .min(outputs.len())
            .min(self.delay_lines.channel_count());

        // One look at the controls per block. Only the ping-pong rate is
        // re-read per frame.
        let params = self.params.snapshot();
        let base_delay = self.base_delay_samples(params.time_interval);
        let dry = params.dry as f32;
        let wet = params.wet as f32;
        let feedback = params.feedback as f32;
        let ping_pong = params.ping_pong && num_channels >= 2;
        let sample_rate = self.sample_rate as f32;

        for i in 0..frame_count {
            let gains = if ping_pong {
                let pan = self.oscillator.current_pan();
                let frequency = self.params.get(ParameterAddress::Frequency);
                self.oscillator
                    .advance(ModulationOscillator::phase_increment(frequency, sample_rate));
                Some(PanGains::from_pan(pan))
            } else {
                None
            };

            for ch in 0..num_channels {
                let input = inputs[ch].as_ref()[i];

                let delayed = if params.zeno {
                    let echo = zeno_echo_sum(&self.delay_lines, ch, base_delay);
                    let write = (input + echo * ZENO_FEEDBACK).clamp(-1.0, 1.0);
                    self.delay_lines.write(ch, write);
                    echo
                } else {
                    let delayed = self.delay_lines.read(ch, base_delay);
                    self.delay_lines.write(ch, input + delayed * feedback);
                    delayed
                };

                let gain = gains.map_or(1.0, |gains| gains.for_channel(ch));
                outputs[ch].as_mut()[i] = input * dry + delayed * wet * gain;

                self.delay_lines.advance(ch);
            }
        }
    }
}

/// Geometric sum of taps at `base_delay`, `base_delay / 2`, `base_delay / 4`,
/// ... down to 1, weighted `0.9`, `0.45`, `0.225`, ...
pub fn zeno_echo_sum(lines: &DelayLineBank, channel: usize, base_delay: usize) -> f32 {
    let mut gain = ZENO_FIRST_TAP_GAIN;
    let mut delay = base_delay;
    let mut sum = 0.0;

    while delay >= 1 {
        sum += lines.read(channel, delay) * gain;
        gain *= ZENO_FEEDBACK;
        delay /= 2;
    }

    sum
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
