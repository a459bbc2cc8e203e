//! # Revo Delay — A Feedback / Zeno Delay (AU/VST3/CLAP)
//!
//! A delay effect with two mutually exclusive algorithms and optional
//! ping-pong panning, built with
//! [nih-plug](https://github.com/robbert-vdh/nih-plug). The render core
//! ([`DelayKernel`]) knows nothing about plugin formats and can be driven
//! directly; [`RevoDelay`] is the thin nih-plug shell around it.
//!
//! ## Signal Flow
//!
//! ```text
//! Input ──┬───────────────────────────────────────────── × dry ────┐
//!         │                                                        │
//!         │   ┌───────────── standard ─────────────┐               │
//!         ├──►│ line[-d]          × feedback ──┐   │               │
//!         │   └────────────────────────────────┼───┘               │
//!         │   ┌────────────── zeno ────────────┼───┐               │
//!         └──►│ Σ line[-d/2^k] · 0.9·0.5^k  × 0.5, clamp ±1        │
//!             └──────────────┬─────────────────────┘               │
//!                            │                                     │
//!                            └── × wet ── × ping-pong pan ───────►(+)──► Output
//! ```

pub mod dsp;
pub mod events;
pub mod kernel;
pub mod parameters;
mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use nih_plug::prelude::*;

pub use kernel::{DelayKernel, KernelError};
pub use parameters::{ParameterAddress, ParameterStore};
use params::RevoParams;

/// The plugin: host parameters, the render kernel, and the scratch space
/// that turns nih-plug's in-place buffer into separate input and output.
pub struct RevoDelay {
    params: Arc<RevoParams>,

    kernel: DelayKernel,

    /// Copy of the block's input, one `max_buffer_size` vector per
    /// channel. Allocated in `initialize()`.
    input_scratch: Vec<Vec<f32>>,
}

impl Default for RevoDelay {
    fn default() -> Self {
        Self {
            params: Arc::new(RevoParams::default()),
            kernel: DelayKernel::new(),
            input_scratch: Vec::new(),
        }
    }
}

impl Plugin for RevoDelay {
    const NAME: &'static str = "Revo Delay";
    const VENDOR: &'static str = "Revo Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // The kernel requires as many outputs as inputs, so only symmetric
    // layouts are offered. Stereo first; most tracks are stereo.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Controls are sampled once per block, so splitting blocks at
    // automation points would buy nothing.
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Size the delay lines for the host's sample rate and channel count.
    ///
    /// Returning `false` tells the host this configuration can't be used.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let num_inputs = audio_io_layout
            .main_input_channels
            .map(|c| c.get() as usize)
            .unwrap_or(0);
        let num_outputs = audio_io_layout
            .main_output_channels
            .map(|c| c.get() as usize)
            .unwrap_or(0);

        if let Err(err) =
            self.kernel
                .initialize(num_inputs, num_outputs, buffer_config.sample_rate as f64)
        {
            nih_error!("Revo Delay cannot run with this configuration: {err}");
            return false;
        }

        self.kernel
            .set_maximum_frames_to_render(buffer_config.max_buffer_size);

        let max_frames = buffer_config.max_buffer_size as usize;
        self.input_scratch = (0..num_inputs).map(|_| vec![0.0; max_frames]).collect();

        nih_log!(
            "Revo Delay initialized: {num_inputs} channel(s) at {} Hz, {} samples of delay per channel",
            buffer_config.sample_rate,
            self.kernel.delay_capacity()
        );

        true
    }

    /// Playback stopped: drop any echoes still in the lines.
    fn reset(&mut self) {
        self.kernel.reset();
    }

    fn deactivate(&mut self) {
        self.kernel.de_initialize();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        self.params.apply_to(self.kernel.parameter_store());
        self.kernel.set_bypass(self.params.bypass.value());

        let frames = buffer.samples();
        let block_start = context.transport().pos_samples().unwrap_or(0);

        let channels = buffer.as_slice();
        for (scratch, channel) in self.input_scratch.iter_mut().zip(channels.iter()) {
            scratch[..frames].copy_from_slice(&channel[..frames]);
        }

        self.kernel
            .process(&self.input_scratch[..], channels, block_start, frames);

        let snapshot = self.kernel.parameter_store().snapshot();
        let delay = self.kernel.base_delay_samples(snapshot.time_interval);
        let tail = if snapshot.zeno {
            Some(zeno_tail_samples(delay))
        } else {
            tail_samples(delay, snapshot.feedback)
        };

        match tail {
            Some(samples) => ProcessStatus::Tail(samples),
            None => ProcessStatus::KeepAlive,
        }
    }
}

/// How long echoes stay audible after the input goes silent.
///
/// Each repeat is `feedback` times the previous one, so the tail lasts
/// until `feedback^N` falls to -60 dB:
///
/// ```text
/// N = log10(0.001) / log10(feedback) = -3 / log10(feedback)
/// ```
///
/// Returns `None` when the loop never decays (`|feedback| >= 1`).
fn tail_samples(delay_samples: usize, feedback: f64) -> Option<u32> {
    let feedback = feedback.abs();
    let delay = delay_samples as f64;

    if feedback >= 1.0 {
        None
    } else if feedback > 0.001 {
        let repeats = -3.0 / feedback.log10();
        Some((repeats * delay).ceil() as u32)
    } else {
        // A single echo.
        Some(delay_samples as u32)
    }
}

/// Tail length of the Zeno loop, in samples.
///
/// Every tap feeds back, so the written signal obeys
///
/// ```text
/// w[n] = x[n] + Σ g_k · w[n - D_k]      D_k = d / 2^k,  g_k = 0.5 · 0.9 · 0.5^k
/// ```
///
/// Its slowest mode decays by `r` per sample, where `r` is the root of
/// `Σ g_k · r^-D_k = 1` in `(0, 1)`. The left side falls as `r` grows, so
/// bisection finds it. The root is approached from above, which can only
/// lengthen the tail. One extra `d` covers the wait for the first echo.
fn zeno_tail_samples(delay_samples: usize) -> u32 {
    let loop_gain = |r: f64| {
        let mut gain = (kernel::ZENO_FEEDBACK * kernel::ZENO_FIRST_TAP_GAIN) as f64;
        let mut delay = delay_samples;
        let mut sum = 0.0;
        while delay >= 1 {
            sum += gain * r.powf(-(delay as f64));
            gain *= kernel::ZENO_FEEDBACK as f64;
            delay /= 2;
        }
        sum
    };

    let (mut low, mut high) = (0.0_f64, 1.0_f64);
    for _ in 0..64 {
        let mid = 0.5 * (low + high);
        if loop_gain(mid) > 1.0 {
            low = mid;
        } else {
            high = mid;
        }
    }

    // -60 dB after N samples: r^N = 0.001.
    let decay = 0.001_f64.ln() / high.ln();
    (delay_samples as f64 + decay).ceil() as u32
}

impl ClapPlugin for RevoDelay {
    const CLAP_ID: &'static str = "com.revo-audio.revo-delay";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Feedback delay with a recursive Zeno echo mode and ping-pong panning");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for RevoDelay {
    // `*b"..."` turns a 16-character ASCII literal into `[u8; 16]`.
    const VST3_CLASS_ID: [u8; 16] = *b"RevoDelayKernel1";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

nih_export_clap!(RevoDelay);
nih_export_vst3!(RevoDelay);

// AUv2 entry point for hosts that only load Audio Units.
clap_wrapper::export_auv2!();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_without_feedback_is_one_delay() {
        assert_eq!(tail_samples(22_050, 0.0), Some(22_050));
    }

    #[test]
    fn test_tail_grows_with_feedback() {
        // 0.5^10 ≈ -60 dB: log10(0.5) ≈ -0.30103, 3 / 0.30103 ≈ 9.966.
        let tail = tail_samples(100, 0.5).unwrap();
        assert_eq!(tail, 997);

        let longer = tail_samples(100, 0.9).unwrap();
        assert!(longer > tail);
    }

    #[test]
    fn test_tail_is_endless_at_unity_feedback() {
        assert_eq!(tail_samples(100, 1.0), None);
        assert_eq!(tail_samples(100, -1.5), None);
    }

    /// Render a Zeno impulse and check it has died away to -60 dB by the
    /// reported tail, while the plain feedback rule with the 0.5 Zeno
    /// coefficient would have cut it off early.
    #[test]
    fn test_zeno_tail_outlasts_the_echoes() {
        let mut engine = DelayKernel::new();
        engine.initialize(1, 1, 1000.0).unwrap();
        engine.set_maximum_frames_to_render(u32::MAX);
        engine.set_parameter(ParameterAddress::TimeInterval, 0.1);
        engine.set_parameter(ParameterAddress::Dry, 0.0);
        engine.set_parameter(ParameterAddress::Wet, 100.0);
        engine.set_parameter(ParameterAddress::Zeno, 1.0);

        let d = engine.base_delay_samples(0.1_f32 as f64);
        assert_eq!(d, 100);
        let tail = zeno_tail_samples(d) as usize;

        let frames = tail + 2000;
        let mut inputs = vec![vec![0.0; frames]];
        inputs[0][0] = 1.0;
        let mut outputs = vec![vec![0.0; frames]];
        engine.process(&inputs[..], &mut outputs[..], 0, frames);
        let out = &outputs[0];

        let peak_after_tail = out[tail..].iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!(
            peak_after_tail < 0.001,
            "tail {tail}: {peak_after_tail} still above -60 dB"
        );

        let single_loop = tail_samples(d, kernel::ZENO_FEEDBACK as f64).unwrap() as usize;
        assert!(single_loop < tail);
        assert!(out[single_loop..].iter().any(|s| s.abs() >= 0.001));
    }

    #[test]
    fn test_zeno_tail_at_unit_delay() {
        // One tap of gain 0.45: 1 + ln(0.001) / ln(0.45) ≈ 9.65.
        assert_eq!(zeno_tail_samples(1), 10);
    }

    #[test]
    fn test_zeno_tail_grows_with_delay() {
        let short = zeno_tail_samples(100);
        let long = zeno_tail_samples(1000);
        assert!(long > short);
    }

    #[test]
    fn test_default_plugin_is_not_initialized() {
        let plugin = RevoDelay::default();
        assert_eq!(plugin.kernel.delay_capacity(), 0);
        assert!(plugin.input_scratch.is_empty());
    }
}
