//! Instrument Export
//!
//! Turns a [`Bank`] plus its BD data into a format-neutral instrument model:
//! de-duplicated samples, one instrument per program with one zone per tone,
//! and one preset per program. A [`SoundFontWriter`] serializes the model.
//!
//! # Examples
//!
//! ```no_run
//! use ps2snd::bank_loader::load_bank_pair;
//! use ps2snd::export::{export_bank, json::JsonWriter, ExportOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (bank, bd) = load_bank_pair("music.hd", None)?;
//! let options = ExportOptions::new().bank_name("Music");
//! let mut writer = JsonWriter::create("music.json")?;
//! export_bank(&bank, &bd, &options, &mut writer)?;
//! # Ok(())
//! # }
//! ```

pub mod json;
pub mod mapper;
pub mod sample_cache;
#[cfg(feature = "export-wav")]
pub mod wav;

pub use mapper::{
    loop_region, pan_generator, sustain_attenuation, InstrumentMapper, SampleSource,
};
pub use sample_cache::{CachedSample, SampleCache};

use serde::Serialize;

use crate::bank::Bank;
use crate::Result;

/// Export configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Bank name written to the container
    pub bank_name: String,
    /// Target sound engine name
    pub sound_engine: String,
    /// ROM name
    pub rom_name: String,
    /// Root key used for tones whose base note is 0
    pub default_root_key: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            bank_name: "PS2snd Export".to_string(),
            sound_engine: "Emu10k1".to_string(),
            rom_name: "ROM".to_string(),
            default_root_key: 60,
        }
    }
}

impl ExportOptions {
    /// Create options with the default names
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bank name
    pub fn bank_name(mut self, name: impl Into<String>) -> Self {
        self.bank_name = name.into();
        self
    }

    /// Set the sound engine name
    pub fn sound_engine(mut self, engine: impl Into<String>) -> Self {
        self.sound_engine = engine.into();
        self
    }

    /// Set the ROM name
    pub fn rom_name(mut self, name: impl Into<String>) -> Self {
        self.rom_name = name.into();
        self
    }

    /// Set the fallback root key
    pub fn default_root_key(mut self, key: u8) -> Self {
        self.default_root_key = key;
        self
    }
}

/// Sample playback mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SampleMode {
    /// Play once
    NoLoop,
    /// Repeat the loop region while the key is held
    LoopContinuously,
}

/// Zone generator value
///
/// Durations are timecents, sustain is attenuation in centibels and pan is
/// -500 (left) to 500 (right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Generator {
    /// Loop behaviour
    SampleModes(SampleMode),
    /// Inclusive key range
    KeyRange {
        /// Lowest key
        low: u8,
        /// Highest key
        high: u8,
    },
    /// Stereo position
    Pan(i16),
    /// Attack time
    AttackVolEnv(i16),
    /// Decay time
    DecayVolEnv(i16),
    /// Release time
    ReleaseVolEnv(i16),
    /// Sustain attenuation
    SustainVolEnv(u16),
}

/// Decoded sample handed to the writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSample {
    /// Sample name
    pub name: String,
    /// Mono PCM
    pub pcm: Vec<i16>,
    /// Loop start frame
    pub loop_start: u32,
    /// Loop end frame, always inside the sample
    pub loop_end: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// MIDI root key
    pub root_key: u8,
    /// Fine tune in cents
    pub fine_tune: i8,
}

/// One key-range/sample assignment of an instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Zone {
    /// Index into [`ExportModel::samples`]
    pub sample: usize,
    /// Generators in emission order
    pub generators: Vec<Generator>,
}

impl Zone {
    /// Pan generator value
    pub fn pan(&self) -> Option<i16> {
        self.generators.iter().find_map(|g| match g {
            Generator::Pan(pan) => Some(*pan),
            _ => None,
        })
    }

    /// Key range generator value
    pub fn key_range(&self) -> Option<(u8, u8)> {
        self.generators.iter().find_map(|g| match g {
            Generator::KeyRange { low, high } => Some((*low, *high)),
            _ => None,
        })
    }

    /// Sample mode generator value
    pub fn sample_mode(&self) -> Option<SampleMode> {
        self.generators.iter().find_map(|g| match g {
            Generator::SampleModes(mode) => Some(*mode),
            _ => None,
        })
    }
}

/// Instrument built from one program
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instrument {
    /// Program name
    pub name: String,
    /// Zones in tone order
    pub zones: Vec<Zone>,
}

/// Preset selecting one instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preset {
    /// Preset name
    pub name: String,
    /// Preset number (the program id)
    pub preset: u32,
    /// Bank number
    pub bank: u16,
    /// Index into [`ExportModel::instruments`]
    pub instrument: usize,
    /// Key range of the single preset zone
    pub key_range: (u8, u8),
}

/// Complete export model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportModel {
    /// Bank name
    pub bank_name: String,
    /// Sound engine name
    pub sound_engine: String,
    /// ROM name
    pub rom_name: String,
    /// De-duplicated samples
    pub samples: Vec<ExportSample>,
    /// One instrument per program
    pub instruments: Vec<Instrument>,
    /// One preset per program
    pub presets: Vec<Preset>,
}

/// Serializes an [`ExportModel`] into a container format
pub trait SoundFontWriter {
    /// Write the whole model
    fn write(&mut self, model: &ExportModel) -> Result<()>;
}

/// Map a bank and write it in one go
pub fn export_bank<S, W>(
    bank: &Bank,
    source: &S,
    options: &ExportOptions,
    writer: &mut W,
) -> Result<ExportModel>
where
    S: SampleSource + ?Sized,
    W: SoundFontWriter + ?Sized,
{
    let model = InstrumentMapper::new(source, options).map_bank(bank);
    writer.write(&model)?;
    Ok(model)
}
