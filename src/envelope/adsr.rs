//! Hardware ADSR State Machine
//!
//! Phases run Attack → Decay → Sustain, with Release → Off after key-off.
//! Every phase entry re-arms the [`VolumeEnvelope`] from the register fields.

use std::fmt;

use super::register::AdsrRegister;
use super::volume::VolumeEnvelope;

/// Rate mask for phases with a 7-bit rate field
const FULL_RATE_MASK: u8 = 0x7F;

/// Rate mask for phases with a shift-only rate field
const SHIFT_RATE_MASK: u8 = 0x1F << 2;

/// Envelope phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdsrPhase {
    /// Rising towards full level
    Attack,
    /// Falling towards the sustain level
    Decay,
    /// Held until key-off
    Sustain,
    /// Falling towards silence after key-off
    Release,
    /// Silent
    Off,
}

impl AdsrPhase {
    /// Phase entered when this one reaches its target
    ///
    /// Sustain and Off have no automatic successor.
    pub fn next(self) -> Option<AdsrPhase> {
        match self {
            AdsrPhase::Attack => Some(AdsrPhase::Decay),
            AdsrPhase::Decay => Some(AdsrPhase::Sustain),
            AdsrPhase::Release => Some(AdsrPhase::Off),
            AdsrPhase::Sustain | AdsrPhase::Off => None,
        }
    }
}

impl fmt::Display for AdsrPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdsrPhase::Attack => "attack",
            AdsrPhase::Decay => "decay",
            AdsrPhase::Sustain => "sustain",
            AdsrPhase::Release => "release",
            AdsrPhase::Off => "off",
        };
        f.write_str(name)
    }
}

/// SPU ADSR unit for one voice
#[derive(Debug, Clone)]
pub struct HardwareAdsr {
    reg: AdsrRegister,
    reg_val: u32,
    phase: AdsrPhase,
    current_volume: i16,
    target_volume: i16,
    envelope: VolumeEnvelope,
}

impl HardwareAdsr {
    /// Create a silent unit for a combined register value
    pub fn new(reg_val: u32) -> Self {
        HardwareAdsr {
            reg: AdsrRegister::from_u32(reg_val),
            reg_val,
            phase: AdsrPhase::Off,
            current_volume: 0,
            target_volume: 0,
            envelope: VolumeEnvelope::new(),
        }
    }

    /// Create a unit from the two 16-bit registers
    pub fn from_pair(adsr1: u16, adsr2: u16) -> Self {
        Self::new(((adsr2 as u32) << 16) | adsr1 as u32)
    }

    /// Combined register value
    pub fn register(&self) -> u32 {
        self.reg_val
    }

    /// Current phase
    pub fn phase(&self) -> AdsrPhase {
        self.phase
    }

    /// Current level
    pub fn volume(&self) -> i16 {
        self.current_volume
    }

    /// Level the current phase moves towards
    pub fn target(&self) -> i16 {
        self.target_volume
    }

    /// Segment state of the current phase
    pub fn envelope(&self) -> &VolumeEnvelope {
        &self.envelope
    }

    /// Start the attack from silence
    pub fn key_on(&mut self) {
        self.current_volume = 0;
        self.phase = AdsrPhase::Attack;
        self.update_envelope();
    }

    /// Enter release; ignored when already releasing or off
    pub fn key_off(&mut self) {
        if matches!(self.phase, AdsrPhase::Off | AdsrPhase::Release) {
            return;
        }
        self.phase = AdsrPhase::Release;
        self.update_envelope();
    }

    /// Jump straight into `phase` at `volume` without passing through earlier phases
    pub fn force_phase(&mut self, phase: AdsrPhase, volume: i16) {
        self.phase = phase;
        self.current_volume = volume;
        self.update_envelope();
    }

    /// Advance one sample and return the level
    ///
    /// In Off this returns 0 and leaves the level untouched.
    pub fn tick(&mut self) -> i16 {
        if self.phase == AdsrPhase::Off {
            return 0;
        }
        self.step();
        self.current_volume
    }

    /// Advance one sample through the state machine
    ///
    /// Returns the phase after the step and whether a transition happened.
    pub fn step(&mut self) -> (AdsrPhase, bool) {
        if self.phase == AdsrPhase::Off {
            return (AdsrPhase::Off, false);
        }

        if self.envelope.counter_increment > 0 {
            self.envelope.tick(&mut self.current_volume);
        }

        if self.phase == AdsrPhase::Sustain {
            return (self.phase, false);
        }

        let reached = if self.envelope.decreasing {
            self.current_volume <= self.target_volume
        } else {
            self.current_volume >= self.target_volume
        };
        if !reached {
            return (self.phase, false);
        }

        match self.phase.next() {
            Some(next) => {
                self.phase = next;
                self.update_envelope();
                (next, true)
            }
            None => (self.phase, false),
        }
    }

    /// Re-arm the segment for the current phase
    fn update_envelope(&mut self) {
        let reg = self.reg;
        match self.phase {
            AdsrPhase::Off => {
                self.target_volume = 0;
                self.envelope.reset(0, 0, false, false, false);
            }
            AdsrPhase::Attack => {
                self.target_volume = 32767;
                self.envelope.reset(
                    reg.attack_rate(),
                    FULL_RATE_MASK,
                    false,
                    reg.attack_exponential,
                    false,
                );
            }
            AdsrPhase::Decay => {
                self.target_volume = reg.sustain_target();
                self.envelope
                    .reset(reg.decay_rate(), SHIFT_RATE_MASK, true, true, false);
            }
            AdsrPhase::Sustain => {
                self.target_volume = 0;
                self.envelope.reset(
                    reg.sustain_rate(),
                    FULL_RATE_MASK,
                    reg.sustain_decreasing,
                    reg.sustain_exponential,
                    false,
                );
            }
            AdsrPhase::Release => {
                self.target_volume = 0;
                self.envelope.reset(
                    reg.release_rate(),
                    SHIFT_RATE_MASK,
                    true,
                    reg.release_exponential,
                    false,
                );
            }
        }
    }
}
