//! Sound Bank Domain Model
//!
//! The Program/Tone hierarchy rebuilt from an HD header. A [`Bank`] is built
//! once per loaded file and treated as read-only afterwards; loading a new
//! HD file replaces the whole bank.

use serde::Serialize;

/// Mask of the attack-mode bit inside `adsr1`
const ADSR1_ATTACK_EXP: u16 = 0x8000;

/// One playable key-range/sample assignment inside a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tone {
    /// Lowest MIDI note of the split range
    pub min_note: u8,
    /// Highest MIDI note of the split range (127 when the stored range was inverted)
    pub max_note: u8,
    /// Sample base note
    pub root_key: u8,
    /// Combined split + sample detune (wrapping 8-bit signed sum)
    pub pitch_fine: i8,
    /// Final pan, 0..=127 with 64 = center
    pub pan: u8,
    /// Sample volume
    pub volume: u8,
    /// Raw SPU ADSR1 register
    pub adsr1: u16,
    /// Raw SPU ADSR2 register
    pub adsr2: u16,
    /// Absolute byte offset of the VAG data inside the BD file
    pub bd_offset: u32,
    /// Playback sample rate in Hz
    pub sample_rate: u32,
    /// Sample group routes this tone to the reverb bus
    pub reverb_enabled: bool,
}

impl Tone {
    /// Combined 32-bit ADSR register (`adsr2` in the high half)
    pub fn adsr_register(&self) -> u32 {
        ((self.adsr2 as u32) << 16) | self.adsr1 as u32
    }

    /// Whether the attack segment uses the exponential curve
    pub fn attack_exponential(&self) -> bool {
        self.adsr1 & ADSR1_ATTACK_EXP != 0
    }

    /// Raw 4-bit sustain level field
    pub fn sustain_level(&self) -> u8 {
        (self.adsr1 & 0x0F) as u8
    }
}

/// A playable instrument composed of one or more tones
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Program {
    /// Program table slot index
    pub id: u32,
    /// Display name
    pub name: String,
    /// Tones in split/sample enumeration order (significant for stereo pairing)
    pub tones: Vec<Tone>,
    /// Program master volume
    pub master_vol: u8,
    /// Raw program pan byte
    pub master_pan: u8,
    /// More than one tone ended up in this program
    pub is_layered: bool,
}

impl Program {
    /// Create an empty program for a table slot
    pub fn new(id: u32) -> Self {
        Program {
            id,
            name: format!("Program {}", id),
            tones: Vec::new(),
            master_vol: 0,
            master_pan: 0,
            is_layered: false,
        }
    }
}

/// Root aggregate of one loaded HD file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Bank {
    /// Programs in program-table order (absent slots omitted)
    pub programs: Vec<Program>,
    /// Set once a header was fully walked
    pub valid: bool,
}

impl Bank {
    /// Look up a program by its table id
    pub fn program(&self, id: u32) -> Option<&Program> {
        self.programs.iter().find(|p| p.id == id)
    }

    /// Total number of tones across all programs
    pub fn tone_count(&self) -> usize {
        self.programs.iter().map(|p| p.tones.len()).sum()
    }
}
