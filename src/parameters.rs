//! # Parameter Store
//!
//! The render kernel's view of the controls. Values arrive in host units
//! (seconds, percent, 0/1 switches, Hz) and are stored in the units the
//! DSP wants:
//!
//! | Address        | Host value   | Stored as                 |
//! |----------------|--------------|---------------------------|
//! | `timeinterval` | seconds      | seconds (`f64`)           |
//! | `dry`          | 0–100 %      | ratio, `value / 100`      |
//! | `wet`          | 0–100 %      | ratio, `value / 100`      |
//! | `feedback`     | 0–100 %      | ratio, `value / 100`      |
//! | `zeno`         | 0 / 1        | `bool` (any non-zero = on) |
//! | `pingpong`     | 0 / 1        | `bool` (any non-zero = on) |
//! | `frequency`    | Hz           | Hz (`f32`)                |
//!
//! Nothing is clamped. Out-of-range values pass straight through to the
//! DSP, and the caller is responsible for sending sane ones.
//!
//! ## Threading
//!
//! A control thread writes while the render thread reads, with no lock in
//! between. Each field is its own atomic accessed with `Relaxed` ordering:
//! a single value is never torn, but the render thread may see one field
//! of a multi-field update before the others. It picks up whatever is
//! there when the block starts.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// The closed set of controls, numbered as the host addresses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterAddress {
    TimeInterval = 0,
    Dry = 1,
    Wet = 2,
    Feedback = 3,
    Zeno = 4,
    PingPong = 5,
    Frequency = 6,
}

impl ParameterAddress {
    pub const ALL: [ParameterAddress; 7] = [
        ParameterAddress::TimeInterval,
        ParameterAddress::Dry,
        ParameterAddress::Wet,
        ParameterAddress::Feedback,
        ParameterAddress::Zeno,
        ParameterAddress::PingPong,
        ParameterAddress::Frequency,
    ];

    /// Map a raw host address onto a known control.
    pub fn from_raw(raw: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|address| *address as u64 == raw)
    }

    /// Stable string identifier, matching the host-facing parameter IDs.
    pub fn identifier(self) -> &'static str {
        match self {
            ParameterAddress::TimeInterval => "timeinterval",
            ParameterAddress::Dry => "dry",
            ParameterAddress::Wet => "wet",
            ParameterAddress::Feedback => "feedback",
            ParameterAddress::Zeno => "zeno",
            ParameterAddress::PingPong => "pingpong",
            ParameterAddress::Frequency => "frequency",
        }
    }
}

/// Default control values, in host units.
pub mod defaults {
    pub const TIME_INTERVAL_SECONDS: f32 = 0.5;
    pub const DRY_PERCENT: f32 = 100.0;
    pub const WET_PERCENT: f32 = 50.0;
    pub const FEEDBACK_PERCENT: f32 = 25.0;
    pub const FREQUENCY_HZ: f32 = 0.25;
}

/// A plain copy of the per-block values, taken once per block by the
/// render thread. The ping-pong frequency is not part of it; the kernel
/// reads that every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSnapshot {
    pub time_interval: f64,
    pub dry: f64,
    pub wet: f64,
    pub feedback: f64,
    pub zeno: bool,
    pub ping_pong: bool,
}

/// `f64` stored as its bit pattern.
#[derive(Debug)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    #[inline]
    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// `f32` stored as its bit pattern.
#[derive(Debug)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Lock-free store for the current (target) value of every control.
///
/// Shared between threads as `Arc<ParameterStore>`; every method takes
/// `&self`.
#[derive(Debug)]
pub struct ParameterStore {
    time_interval: AtomicF64,
    dry: AtomicF64,
    wet: AtomicF64,
    feedback: AtomicF64,
    zeno: AtomicBool,
    ping_pong: AtomicBool,
    frequency: AtomicF32,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self {
            time_interval: AtomicF64::new(defaults::TIME_INTERVAL_SECONDS as f64),
            dry: AtomicF64::new(defaults::DRY_PERCENT as f64 / 100.0),
            wet: AtomicF64::new(defaults::WET_PERCENT as f64 / 100.0),
            feedback: AtomicF64::new(defaults::FEEDBACK_PERCENT as f64 / 100.0),
            zeno: AtomicBool::new(false),
            ping_pong: AtomicBool::new(false),
            frequency: AtomicF32::new(defaults::FREQUENCY_HZ),
        }
    }
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a host-unit `value` for `address`.
    pub fn set(&self, address: ParameterAddress, value: f32) {
        match address {
            ParameterAddress::TimeInterval => self.time_interval.store(value as f64),
            ParameterAddress::Dry => self.dry.store(value as f64 / 100.0),
            ParameterAddress::Wet => self.wet.store(value as f64 / 100.0),
            ParameterAddress::Feedback => self.feedback.store(value as f64 / 100.0),
            ParameterAddress::Zeno => self.zeno.store(value != 0.0, Ordering::Relaxed),
            ParameterAddress::PingPong => self.ping_pong.store(value != 0.0, Ordering::Relaxed),
            ParameterAddress::Frequency => self.frequency.store(value),
        }
    }

    /// The stored value for `address`, converted back to host units.
    pub fn get(&self, address: ParameterAddress) -> f32 {
        match address {
            ParameterAddress::TimeInterval => self.time_interval.load() as f32,
            ParameterAddress::Dry => (self.dry.load() * 100.0) as f32,
            ParameterAddress::Wet => (self.wet.load() * 100.0) as f32,
            ParameterAddress::Feedback => (self.feedback.load() * 100.0) as f32,
            ParameterAddress::Zeno => bool_to_value(self.zeno.load(Ordering::Relaxed)),
            ParameterAddress::PingPong => bool_to_value(self.ping_pong.load(Ordering::Relaxed)),
            ParameterAddress::Frequency => self.frequency.load(),
        }
    }

    /// [`set()`](Self::set) by raw host address. Unknown addresses are
    /// ignored.
    pub fn set_raw(&self, address: u64, value: f32) {
        if let Some(address) = ParameterAddress::from_raw(address) {
            self.set(address, value);
        }
    }

    /// [`get()`](Self::get) by raw host address. Unknown addresses read
    /// as 0.
    pub fn get_raw(&self, address: u64) -> f32 {
        ParameterAddress::from_raw(address).map_or(0.0, |address| self.get(address))
    }

    /// Internal-unit copy of the per-block values.
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            time_interval: self.time_interval.load(),
            dry: self.dry.load(),
            wet: self.wet.load(),
            feedback: self.feedback.load(),
            zeno: self.zeno.load(Ordering::Relaxed),
            ping_pong: self.ping_pong.load(Ordering::Relaxed),
        }
    }
}

fn bool_to_value(flag: bool) -> f32 {
    if flag {
        1.0
    } else {
        0.0
    }
}
