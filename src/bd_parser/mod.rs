//! BD Sample Data
//!
//! The BD file is a flat array of 16-byte VAG ADPCM blocks addressed by the
//! absolute byte offsets stored in the HD file's VAG info table.

pub mod adpcm;
pub mod extractor;

pub use adpcm::{decode_adpcm, DecodedSample, DEFAULT_SAMPLE_RATE};
pub use extractor::extract_adpcm_blocks;

use std::fs;
use std::path::Path;

use bitflags::bitflags;
use log::{info, warn};

use crate::bank::Tone;
use crate::{Ps2SndError, Result};

/// Size of one ADPCM block in bytes
pub const ADPCM_BLOCK_SIZE: usize = 16;

/// Samples decoded from one block
pub const SAMPLES_PER_BLOCK: usize = 28;

/// Upper bound on the bytes collected for a single sample
pub const MAX_EXTRACT_BYTES: usize = 4 * 1024 * 1024;

bitflags! {
    /// ADPCM block flag byte (byte 1)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BlockFlags: u8 {
        /// Last block of the sample
        const LOOP_END = 0x01;
        /// The sample loops back to the loop start
        const LOOP_REPEAT = 0x02;
        /// First block of the loop region
        const LOOP_START = 0x04;
    }
}

impl BlockFlags {
    /// Create block flags from the raw byte
    pub fn from_byte(value: u8) -> Self {
        BlockFlags::from_bits_truncate(value)
    }
}

/// Encoder quirk: a block starting `00 07 77` ends the sample in silence
pub(crate) fn is_silence_terminator(block: &[u8]) -> bool {
    block.len() >= 3 && block[0] == 0x00 && block[1] == 0x07 && block[2] == 0x77
}

/// Loaded BD file contents
#[derive(Debug, Clone, Default)]
pub struct BdFile {
    data: Vec<u8>,
}

impl BdFile {
    /// Read a BD file from disk
    ///
    /// An empty file is rejected.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        if data.is_empty() {
            return Err(Ps2SndError::EmptyBdFile);
        }
        info!("Loaded BD {}: {} bytes", path.display(), data.len());
        Ok(BdFile { data })
    }

    /// Wrap BD bytes already in memory
    pub fn from_bytes(data: Vec<u8>) -> Self {
        BdFile { data }
    }

    /// Raw file bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// File length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the file holds no data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Extract the block run of the sample starting at `offset`
    pub fn get_adpcm_block(&self, offset: u32) -> Vec<u8> {
        if offset as usize >= self.data.len() {
            warn!(
                "VAG offset 0x{:08X} is outside the {}-byte BD file",
                offset,
                self.data.len()
            );
            return Vec::new();
        }
        extract_adpcm_blocks(&self.data, offset as usize)
    }

    /// Extract and decode the sample at `offset`
    pub fn decode_at(&self, offset: u32, sample_rate: u32) -> DecodedSample {
        decode_adpcm(&self.get_adpcm_block(offset), sample_rate)
    }

    /// Decode the sample a tone plays
    pub fn decode_tone(&self, tone: &Tone) -> DecodedSample {
        self.decode_at(tone.bd_offset, tone.sample_rate)
    }
}
