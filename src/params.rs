//! # Plugin Parameters
//!
//! The knobs and switches the host sees. Each one has:
//!
//! - A **unique string ID** (`#[id = "..."]`) that the host uses to save
//!   and recall presets. These match
//!   [`ParameterAddress::identifier()`](crate::parameters::ParameterAddress::identifier)
//!   and must never change once published.
//! - A **human-readable name** shown in the DAW.
//! - A **range** and **default value**, in the same units the render
//!   kernel's [`ParameterStore`] accepts (seconds, percent, Hz, on/off).
//!
//! ## No Smoothing
//!
//! None of these parameters has a smoother. The kernel reads its controls
//! once per block and applies them as a step, so a large jump in dry, wet
//! or feedback can click. Delay time in particular is a whole-sample read
//! offset; ramping it would need an interpolating read the kernel does
//! not have.

use nih_plug::prelude::*;

use crate::parameters::{defaults, ParameterAddress, ParameterStore};

/// All user-facing parameters for Revo Delay.
#[derive(Params)]
pub struct RevoParams {
    /// **Time Interval** — distance between the dry signal and the first
    /// echo, in seconds.
    ///
    /// Range: 0 to 3 seconds, the length of the delay lines.
    #[id = "timeinterval"]
    pub time_interval: FloatParam,

    /// **Dry Mix** — level of the unprocessed input, in percent.
    #[id = "dry"]
    pub dry: FloatParam,

    /// **Wet Mix** — level of the echoes, in percent.
    #[id = "wet"]
    pub wet: FloatParam,

    /// **Feedback** — how much of each echo is fed back into the delay
    /// line, in percent. Only the standard algorithm listens to it.
    #[id = "feedback"]
    pub feedback: FloatParam,

    /// **Zeno Mode** — swap the feedback delay for the recursive
    /// halving-tap cascade.
    #[id = "zeno"]
    pub zeno: BoolParam,

    /// **Ping Pong** — bounce the echoes between left and right.
    #[id = "pingpong"]
    pub ping_pong: BoolParam,

    /// **Frequency** — ping-pong rate in Hz.
    #[id = "frequency"]
    pub frequency: FloatParam,

    /// Host-facing bypass switch. The kernel copies input to output
    /// while it is on.
    #[id = "bypass"]
    pub bypass: BoolParam,
}

impl Default for RevoParams {
    fn default() -> Self {
        Self {
            time_interval: FloatParam::new(
                "Time Interval",
                defaults::TIME_INTERVAL_SECONDS,
                FloatRange::Linear { min: 0.0, max: 3.0 },
            )
            .with_unit(" s")
            .with_step_size(0.001),

            dry: percent_param("Dry Mix", defaults::DRY_PERCENT),
            wet: percent_param("Wet Mix", defaults::WET_PERCENT),
            feedback: percent_param("Feedback", defaults::FEEDBACK_PERCENT),

            zeno: BoolParam::new("Zeno Mode", false),
            ping_pong: BoolParam::new("Ping Pong", false),

            frequency: FloatParam::new(
                "Frequency",
                defaults::FREQUENCY_HZ,
                FloatRange::Linear { min: 0.0, max: 5.0 },
            )
            .with_unit(" Hz")
            .with_step_size(0.01),

            bypass: BoolParam::new("Bypass", false).make_bypass(),
        }
    }
}

fn percent_param(name: &str, default: f32) -> FloatParam {
    FloatParam::new(name, default, FloatRange::Linear { min: 0.0, max: 100.0 })
        .with_unit(" %")
        .with_step_size(0.1)
}

impl RevoParams {
    /// Push the current host values into the kernel's store. Called once
    /// at the top of every block.
    pub fn apply_to(&self, store: &ParameterStore) {
        store.set(ParameterAddress::TimeInterval, self.time_interval.value());
        store.set(ParameterAddress::Dry, self.dry.value());
        store.set(ParameterAddress::Wet, self.wet.value());
        store.set(ParameterAddress::Feedback, self.feedback.value());
        store.set(ParameterAddress::Zeno, switch_value(self.zeno.value()));
        store.set(ParameterAddress::PingPong, switch_value(self.ping_pong.value()));
        store.set(ParameterAddress::Frequency, self.frequency.value());
    }
}

fn switch_value(on: bool) -> f32 {
    if on {
        1.0
    } else {
        0.0
    }
}
