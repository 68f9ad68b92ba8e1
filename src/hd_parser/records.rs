//! HD Chunk Records
//!
//! Fixed-size little-endian records stored in the HD header. Every record
//! implements [`Record`], so the chunk reader can hand a parser exactly
//! `SIZE` bytes and never lets it read past the end of the file.
//!
//! Layout (bytes):
//! ```text
//! VersionChunk   16   creator, type, chunk size, reserved, major, minor
//! HeaderChunk    72   creator, type, chunk size, file/body size, 5 chunk addrs, 32 reserved
//! ProgramParam   14   split block addr, split count/size, volume, pan, transpose, detune, ...
//! SplitBlock     20   sample set index, key range, bend range, key follow, volume, pan, ...
//! SampleParam    22   VAG index, velocity range, base note, detune, pan, group, ADSR1/2
//! VagInfoParam    8   BD offset, sample rate, attribute
//! ```

use bitflags::bitflags;
use nom::bytes::complete::take;
use nom::combinator::map;
use nom::number::complete::{le_i8, le_u16, le_u32, le_u8};
use nom::sequence::tuple;
use nom::IResult;

/// A fixed-size record decoded from the HD file
pub trait Record: Sized {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Decode the record from the start of `input`
    fn parse(input: &[u8]) -> IResult<&[u8], Self>;
}

/// "IECS" creator tag of the version chunk (little-endian)
pub const IECS_MAGIC: u32 = 0x5343_4549;

/// Version chunk at file offset 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionChunk {
    /// Format family tag, must equal [`IECS_MAGIC`]
    pub creator: u32,
    /// Chunk type tag ("Vers")
    pub kind: u32,
    /// Size of this chunk; the header chunk follows it
    pub chunk_size: u32,
    /// Format major version
    pub major: u8,
    /// Format minor version
    pub minor: u8,
}

impl Record for VersionChunk {
    const SIZE: usize = 16;

    fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        map(
            tuple((le_u32, le_u32, le_u32, le_u16, le_u8, le_u8)),
            |(creator, kind, chunk_size, _reserved, major, minor)| VersionChunk {
                creator,
                kind,
                chunk_size,
                major,
                minor,
            },
        )(input)
    }
}

/// Header chunk holding the sub-table addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderChunk {
    /// Chunk size
    pub chunk_size: u32,
    /// Declared HD file size
    pub file_size: u32,
    /// Declared BD body size
    pub body_size: u32,
    /// Program chunk address
    pub program_chunk_addr: u32,
    /// Sample set chunk address
    pub sample_set_chunk_addr: u32,
    /// Sample chunk address
    pub sample_chunk_addr: u32,
    /// VAG info chunk address
    pub vag_info_chunk_addr: u32,
    /// Sound effect timbre chunk address (unused)
    pub se_timbre_chunk_addr: u32,
}

impl Record for HeaderChunk {
    const SIZE: usize = 72;

    fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        map(
            tuple((
                le_u32,
                le_u32,
                le_u32,
                le_u32,
                le_u32,
                le_u32,
                le_u32,
                le_u32,
                le_u32,
                le_u32,
                take(32usize),
            )),
            |(
                _creator,
                _kind,
                chunk_size,
                file_size,
                body_size,
                program_chunk_addr,
                sample_set_chunk_addr,
                sample_chunk_addr,
                vag_info_chunk_addr,
                se_timbre_chunk_addr,
                _reserved,
            )| HeaderChunk {
                chunk_size,
                file_size,
                body_size,
                program_chunk_addr,
                sample_set_chunk_addr,
                sample_chunk_addr,
                vag_info_chunk_addr,
                se_timbre_chunk_addr,
            },
        )(input)
    }
}

/// Program parameter record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramParam {
    /// Split block array address, relative to this record
    pub split_block_addr: u32,
    /// Number of split blocks
    pub n_split: u8,
    /// Declared size of one split block
    pub size_split_block: u8,
    /// Program volume
    pub volume: u8,
    /// Program pan (signed-magnitude-like byte, 0x40 = center)
    pub panpot: u8,
    /// Program transpose
    pub transpose: i8,
    /// Program detune
    pub detune: i8,
    /// Program attribute flags
    pub attr: u8,
}

impl Record for ProgramParam {
    const SIZE: usize = 14;

    fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        map(
            tuple((
                le_u32, le_u8, le_u8, le_u8, le_u8, le_i8, le_i8, le_i8, le_u8, le_u8, le_u8,
            )),
            |(
                split_block_addr,
                n_split,
                size_split_block,
                volume,
                panpot,
                transpose,
                detune,
                _key_follow_pan,
                _key_follow_pan_center,
                attr,
                _reserved,
            )| ProgramParam {
                split_block_addr,
                n_split,
                size_split_block,
                volume,
                panpot,
                transpose,
                detune,
                attr,
            },
        )(input)
    }
}

/// Key split block, stored as an array after its program record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitBlock {
    /// Index into the sample set table
    pub sample_set_index: u16,
    /// Lowest note of the split
    pub range_low: u8,
    /// Crossfade width
    pub cross_fade: u8,
    /// Highest note of the split
    pub range_high: u8,
    /// Split number
    pub number: u8,
    /// Split volume
    pub volume: u8,
    /// Split pan
    pub panpot: u8,
    /// Split transpose
    pub transpose: i8,
    /// Split detune
    pub detune: i8,
}

impl Record for SplitBlock {
    const SIZE: usize = 20;

    fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        map(
            tuple((
                le_u16,
                tuple((le_u8, le_u8, le_u8, le_u8)),
                tuple((le_u16, le_u16)),
                take(6usize),
                tuple((le_u8, le_u8, le_i8, le_i8)),
            )),
            |(
                sample_set_index,
                (range_low, cross_fade, range_high, number),
                _bend_range,
                _key_follow,
                (volume, panpot, transpose, detune),
            )| SplitBlock {
                sample_set_index,
                range_low,
                cross_fade,
                range_high,
                number,
                volume,
                panpot,
                transpose,
                detune,
            },
        )(input)
    }
}

bitflags! {
    /// Sample group byte
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SampleGroup: u8 {
        /// First reverb routing bit
        const REVERB_A = 0x04;
        /// Second reverb routing bit
        const REVERB_B = 0x08;
    }
}

impl SampleGroup {
    /// Create group flags from the raw byte
    pub fn from_byte(value: u8) -> Self {
        SampleGroup::from_bits_truncate(value)
    }

    /// Check if either reverb bit is set
    pub fn is_reverb_enabled(&self) -> bool {
        self.intersects(SampleGroup::REVERB_A | SampleGroup::REVERB_B)
    }
}

/// Sample parameter record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleParam {
    /// Index into the VAG info table
    pub vag_index: u16,
    /// Lowest velocity
    pub vel_range_low: u8,
    /// Highest velocity
    pub vel_range_high: u8,
    /// Base (root) note
    pub base_note: u8,
    /// Sample detune
    pub detune: i8,
    /// Sample pan
    pub panpot: u8,
    /// Group bits (0x04 / 0x08 route to reverb)
    pub group: u8,
    /// Voice priority
    pub priority: u8,
    /// Sample volume
    pub volume: u8,
    /// Raw ADSR1 register
    pub adsr1: u16,
    /// Raw ADSR2 register
    pub adsr2: u16,
}

impl Record for SampleParam {
    const SIZE: usize = 22;

    fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        map(
            tuple((
                le_u16,
                tuple((le_u8, le_u8, le_u8)),
                take(6usize),
                tuple((le_u8, le_i8, le_u8)),
                tuple((le_u8, le_u8, le_u8, le_u8)),
                tuple((le_u16, le_u16)),
            )),
            |(
                vag_index,
                (vel_range_low, _vel_cross_fade, vel_range_high),
                _vel_follow,
                (base_note, detune, panpot),
                (group, priority, volume, _reserved),
                (adsr1, adsr2),
            )| SampleParam {
                vag_index,
                vel_range_low,
                vel_range_high,
                base_note,
                detune,
                panpot,
                group,
                priority,
                volume,
                adsr1,
                adsr2,
            },
        )(input)
    }
}

/// VAG info record pointing into the BD file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VagInfoParam {
    /// Absolute byte offset of the ADPCM data in the BD file
    pub vag_offset: u32,
    /// Sample rate in Hz
    pub sample_rate: u16,
    /// Attribute byte
    pub attribute: u8,
}

impl Record for VagInfoParam {
    const SIZE: usize = 8;

    fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        map(
            tuple((le_u32, le_u16, le_u8, le_u8)),
            |(vag_offset, sample_rate, attribute, _reserved)| VagInfoParam {
                vag_offset,
                sample_rate,
                attribute,
            },
        )(input)
    }
}
