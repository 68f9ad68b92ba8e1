//! PS2 HD/BD Sound Bank Toolkit
//!
//! Reads the paired header ("HD") and data ("BD") files used by PS2 sound
//! banks, decodes the 4-bit VAG ADPCM sample data, and translates the SPU
//! hardware envelope registers into timecent values so each bank can be
//! re-exported as a sample-based instrument model.
//!
//! # Features
//! - Chunked offset-table header parser (program → split → sample set → sample → VAG)
//! - Lenient resolution: a broken reference drops one tone, never the whole bank
//! - VAG ADPCM block extraction and bit-exact decoding with loop recovery
//! - Cycle-accurate SPU ADSR simulation (attack/decay/sustain/release)
//! - Instrument mapping with stereo pairing and sample de-duplication
//!
//! # Crate feature flags
//! - `export-wav` (default): render a single decoded tone to a WAV file (`export::wav`)
//!
//! # Quick start
//! ```no_run
//! use ps2snd::bank_loader::load_bank_pair;
//! use ps2snd::export::{export_bank, json::JsonWriter, ExportOptions};
//!
//! let (bank, bd) = load_bank_pair("music.hd", None).unwrap();
//! let mut writer = JsonWriter::create("music.json").unwrap();
//! export_bank(&bank, &bd, &ExportOptions::default(), &mut writer).unwrap();
//! ```

#![warn(missing_docs)]

pub mod bank; // Program/Tone domain model
pub mod bank_loader; // HD/BD file pair I/O
pub mod bd_parser; // VAG ADPCM extraction and decoding
pub mod envelope; // SPU ADSR envelope simulation
pub mod export; // Instrument mapping and writers
pub mod hd_parser; // HD header chunk parsing

use std::path::PathBuf;

use hd_parser::ChunkError;

/// Error types for sound bank operations
#[derive(thiserror::Error, Debug)]
pub enum Ps2SndError {
    /// Error while parsing file format
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Header does not start with the IECS version chunk
    #[error("Invalid HD magic 0x{found:08X} (expected IECS)")]
    InvalidMagic {
        /// Creator field found at offset 0
        found: u32,
    },

    /// A primary header record could not be read
    #[error("Unreadable header record: {0}")]
    Chunk(#[from] ChunkError),

    /// No BD file next to the HD file
    #[error("BD file not found: {}", .0.display())]
    MissingBdFile(PathBuf),

    /// BD file exists but holds no data
    #[error("BD file is empty")]
    EmptyBdFile,

    /// Error writing audio file
    #[error("Audio file write error: {0}")]
    AudioFileError(String),

    /// Error serializing the export model
    #[error("Export error: {0}")]
    ExportError(String),

    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for Ps2SndError {
    /// Converts a String into `Ps2SndError::Other`.
    ///
    /// Prefer the specific variants (`ParseError`, `ExportError`, ...) where the
    /// failure has a known category.
    fn from(msg: String) -> Self {
        Ps2SndError::Other(msg)
    }
}

impl From<&str> for Ps2SndError {
    /// Converts a string slice into `Ps2SndError::Other`.
    fn from(msg: &str) -> Self {
        Ps2SndError::Other(msg.to_string())
    }
}

/// Result type for sound bank operations
pub type Result<T> = std::result::Result<T, Ps2SndError>;

// Public API exports
pub use bank::{Bank, Program, Tone};
pub use bank_loader::{load_bank_pair, BankFiles};
pub use bd_parser::{decode_adpcm, BdFile, DecodedSample};
pub use envelope::{simulate_timecents, AdsrPhase, HardwareAdsr, TIMECENTS_INSTANT};
pub use export::{export_bank, ExportModel, ExportOptions, InstrumentMapper, SoundFontWriter};
pub use hd_parser::{parse_hd, HdParser};
