//! Envelope Timing Conversion
//!
//! Sample-based instrument formats describe each envelope segment by a single
//! duration in timecents (`1200 * log2(seconds)`). The SPU curve is neither
//! linear nor simply exponential, so the duration is measured by running the
//! state machine at the reference rate until the segment completes.

use super::adsr::{AdsrPhase, HardwareAdsr};
use super::{MAX_SIMULATION_SECONDS, REFERENCE_SAMPLE_RATE, TIMECENTS_INSTANT};

/// Segments shorter than this are reported as instant
const MIN_SECONDS: f64 = 0.001;

/// Count the samples a segment needs to complete
///
/// Returns `None` when the segment never moves (zero counter increment).
/// The count saturates at the simulation cap.
pub fn simulate_samples(reg_val: u32, phase: AdsrPhase) -> Option<u32> {
    let mut sim = HardwareAdsr::new(reg_val);
    let start_volume = if phase == AdsrPhase::Attack { 0 } else { 32767 };
    sim.force_phase(phase, start_volume);

    if sim.envelope().counter_increment == 0 {
        return None;
    }

    let limit = REFERENCE_SAMPLE_RATE * MAX_SIMULATION_SECONDS;
    let mut samples = 0;
    while samples < limit {
        let (_, transitioned) = sim.step();
        let finished = match phase {
            AdsrPhase::Attack | AdsrPhase::Decay | AdsrPhase::Release => transitioned,
            AdsrPhase::Sustain | AdsrPhase::Off => sim.volume() <= 0,
        };
        if finished {
            break;
        }
        samples += 1;
    }
    Some(samples)
}

/// Duration of one envelope phase in timecents
///
/// The unit starts directly in `phase` (at silence for Attack, full level
/// otherwise). Returns [`TIMECENTS_INSTANT`] when the segment never moves,
/// completes within one sample, or takes under a millisecond.
pub fn simulate_timecents(reg_val: u32, phase: AdsrPhase) -> i16 {
    let Some(samples) = simulate_samples(reg_val, phase) else {
        return TIMECENTS_INSTANT;
    };
    if samples <= 1 {
        return TIMECENTS_INSTANT;
    }

    let seconds = samples as f64 / REFERENCE_SAMPLE_RATE as f64;
    if seconds < MIN_SECONDS {
        return TIMECENTS_INSTANT;
    }
    (1200.0 * seconds.log2()) as i16
}
