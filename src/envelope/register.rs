//! ADSR Register Decoding
//!
//! The 32-bit value is `adsr2 << 16 | adsr1`:
//! ```text
//! bits  0-3   sustain level         bits 16-20  release shift
//! bits  4-7   decay shift           bit  21     release exponential
//! bits  8-9   attack step           bits 22-23  sustain step
//! bits 10-14  attack shift          bits 24-28  sustain shift
//! bit  15     attack exponential    bit  30     sustain decreasing
//!                                   bit  31     sustain exponential
//! ```

#[inline]
fn bits(value: u32, start: u32, len: u32) -> u32 {
    (value >> start) & ((1 << len) - 1)
}

#[inline]
fn flag(value: u32, bit: u32) -> bool {
    bits(value, bit, 1) != 0
}

/// Decoded ADSR register fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdsrRegister {
    /// Sustain level (4 bits)
    pub sustain_level: u8,
    /// Decay shift (4 bits)
    pub decay_shift: u8,
    /// Attack step (2 bits)
    pub attack_step: u8,
    /// Attack shift (5 bits)
    pub attack_shift: u8,
    /// Attack uses the exponential curve
    pub attack_exponential: bool,
    /// Release shift (5 bits)
    pub release_shift: u8,
    /// Release uses the exponential curve
    pub release_exponential: bool,
    /// Sustain step (2 bits)
    pub sustain_step: u8,
    /// Sustain shift (5 bits)
    pub sustain_shift: u8,
    /// Sustain moves towards zero
    pub sustain_decreasing: bool,
    /// Sustain uses the exponential curve
    pub sustain_exponential: bool,
}

impl AdsrRegister {
    /// Decode the combined register
    pub fn from_u32(value: u32) -> Self {
        AdsrRegister {
            sustain_level: bits(value, 0, 4) as u8,
            decay_shift: bits(value, 4, 4) as u8,
            attack_step: bits(value, 8, 2) as u8,
            attack_shift: bits(value, 10, 5) as u8,
            attack_exponential: flag(value, 15),
            release_shift: bits(value, 16, 5) as u8,
            release_exponential: flag(value, 21),
            sustain_step: bits(value, 22, 2) as u8,
            sustain_shift: bits(value, 24, 5) as u8,
            sustain_decreasing: flag(value, 30),
            sustain_exponential: flag(value, 31),
        }
    }

    /// Decode from the two 16-bit halves
    pub fn from_pair(adsr1: u16, adsr2: u16) -> Self {
        Self::from_u32(((adsr2 as u32) << 16) | adsr1 as u32)
    }

    /// Attack rate (7 bits)
    pub fn attack_rate(&self) -> u8 {
        (self.attack_shift << 2) | self.attack_step
    }

    /// Decay rate (shift only, low bits zero)
    pub fn decay_rate(&self) -> u8 {
        self.decay_shift << 2
    }

    /// Sustain rate (7 bits)
    pub fn sustain_rate(&self) -> u8 {
        (self.sustain_shift << 2) | self.sustain_step
    }

    /// Release rate (shift only, low bits zero)
    pub fn release_rate(&self) -> u8 {
        self.release_shift << 2
    }

    /// Level at which decay hands over to sustain
    pub fn sustain_target(&self) -> i16 {
        ((self.sustain_level as i32 + 1) * 0x800).min(32767) as i16
    }
}
