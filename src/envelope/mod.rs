//! SPU ADSR Envelope
//!
//! Cycle-accurate model of the SPU volume envelope:
//! - [`AdsrRegister`]: field decode of the `adsr2 << 16 | adsr1` register pair
//! - [`VolumeEnvelope`]: one linear/exponential segment with its rate counter
//! - [`HardwareAdsr`]: the Attack/Decay/Sustain/Release/Off state machine
//! - [`simulate_timecents`]: segment durations for timecent-based formats

pub mod adsr;
pub mod register;
pub mod timecents;
pub mod volume;

pub use adsr::{AdsrPhase, HardwareAdsr};
pub use register::AdsrRegister;
pub use timecents::{simulate_samples, simulate_timecents};
pub use volume::VolumeEnvelope;

/// Tick rate the envelope is simulated at
pub const REFERENCE_SAMPLE_RATE: u32 = 44_100;

/// Simulations stop after this much envelope time
pub const MAX_SIMULATION_SECONDS: u32 = 15;

/// Timecent value meaning "no duration"
pub const TIMECENTS_INSTANT: i16 = -32768;
