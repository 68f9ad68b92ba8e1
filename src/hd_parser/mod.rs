//! HD Header Parsing
//!
//! The HD file is a sequence of "IECS" chunks:
//! - Version chunk at offset 0 (magic check, locates the header)
//! - Header chunk with the four sub-table addresses
//! - Program, sample set, sample and VAG info tables, each a count plus
//!   `count + 1` chunk-relative offsets

pub mod builder;
pub mod reader;
pub mod records;

pub use builder::{convert_pan, BankModelBuilder, MAX_SET_SAMPLES, MAX_SPLITS};
pub use reader::{ChunkError, ChunkReader, ChunkTables, OffsetTable, MAX_TABLE_ENTRIES, SENTINEL};
pub use records::{
    HeaderChunk, ProgramParam, Record, SampleGroup, SampleParam, SplitBlock, VagInfoParam, VersionChunk,
    IECS_MAGIC,
};

use log::info;

use crate::bank::Bank;
use crate::Result;

/// Trait for parsing sound bank header formats into a [`Bank`]
pub trait FormatParser {
    /// Parse file data and return the bank model
    fn parse(&self, data: &[u8]) -> Result<Bank>;

    /// Get parser name
    fn name(&self) -> &str;
}

/// HD header parser
pub struct HdParser;

impl HdParser {
    /// Create new HD parser
    pub fn new() -> Self {
        HdParser
    }
}

impl Default for HdParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatParser for HdParser {
    fn parse(&self, data: &[u8]) -> Result<Bank> {
        let reader = ChunkReader::new(data);
        let header = reader.read_header()?;
        let tables = reader.load_tables(&header);
        let bank = BankModelBuilder::new(reader, tables).build();

        info!(
            "Parsed HD: {} programs, {} tones",
            bank.programs.len(),
            bank.tone_count()
        );
        Ok(bank)
    }

    fn name(&self) -> &str {
        "PS2 HD"
    }
}

/// Parse a complete HD file held in memory
pub fn parse_hd(data: &[u8]) -> Result<Bank> {
    HdParser::new().parse(data)
}
