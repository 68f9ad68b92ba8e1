//! Chunk Table Reader
//!
//! Random-access, bounds-checked reads over an in-memory HD file, and the
//! table-of-offsets resolution used by every sub-table chunk.
//!
//! Each sub-table chunk at address `A` stores a record count at `A + 12` and
//! `count + 1` u32 offsets at `A + 16`. Offsets are relative to `A`; the
//! value `0xFFFFFFFF` marks an empty slot and is never rebased.

use log::{debug, info, warn};

use super::records::{HeaderChunk, Record, VersionChunk, IECS_MAGIC};
use crate::{Ps2SndError, Result};

/// Offset value meaning "no record"
pub const SENTINEL: u32 = 0xFFFF_FFFF;

/// Largest record count accepted for one offset table
pub const MAX_TABLE_ENTRIES: u32 = 100_000;

/// Minimum distance between the version chunk and the header chunk
const MIN_VERSION_CHUNK_SIZE: u32 = 16;

/// Failure of a single bounds-checked read
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkError {
    /// Offset is the sentinel; the record does not exist
    #[error("record is absent (sentinel offset)")]
    Absent,

    /// Offset lies at or past the end of the file
    #[error("offset 0x{offset:08X} is outside the {len}-byte file")]
    OutOfBounds {
        /// Requested offset
        offset: u32,
        /// File length
        len: usize,
    },

    /// Fewer bytes remain than were requested
    #[error("read of {wanted} bytes at 0x{offset:08X} truncated to {available}")]
    Truncated {
        /// Requested offset
        offset: u32,
        /// Requested length
        wanted: usize,
        /// Bytes actually available
        available: usize,
    },

    /// An offset table declares an implausible record count
    #[error("offset table at 0x{addr:08X} declares {count} records")]
    CorruptCount {
        /// Chunk address of the table
        addr: u32,
        /// Declared count
        count: u32,
    },
}

impl ChunkError {
    /// Whether this failure just means "no record here"
    pub fn is_absent(&self) -> bool {
        matches!(self, ChunkError::Absent)
    }
}

/// Rebased offsets of one sub-table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetTable {
    offsets: Vec<u32>,
}

impl OffsetTable {
    /// Wrap already-rebased offsets
    pub fn new(offsets: Vec<u32>) -> Self {
        OffsetTable { offsets }
    }

    /// Number of slots, including the trailing terminator slot
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the table has no slots at all
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Absolute offset of slot `index`, or `None` if out of range or empty
    pub fn resolve(&self, index: usize) -> Option<u32> {
        match self.offsets.get(index) {
            Some(&offset) if offset != SENTINEL => Some(offset),
            _ => None,
        }
    }

    /// Raw slot values (sentinels included)
    pub fn slots(&self) -> &[u32] {
        &self.offsets
    }
}

/// The four sub-tables referenced by the header chunk
#[derive(Debug, Clone, Default)]
pub struct ChunkTables {
    /// Program records
    pub programs: OffsetTable,
    /// Sample set records
    pub sample_sets: OffsetTable,
    /// Sample parameter records
    pub samples: OffsetTable,
    /// VAG info records
    pub vag_infos: OffsetTable,
}

/// Bounds-checked reader over HD file bytes
#[derive(Debug, Clone, Copy)]
pub struct ChunkReader<'a> {
    data: &'a [u8],
}

impl<'a> ChunkReader<'a> {
    /// Create a reader over the whole HD file
    pub fn new(data: &'a [u8]) -> Self {
        ChunkReader { data }
    }

    /// File length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the file is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read exactly `size` bytes at `offset`
    pub fn read_at(&self, offset: u32, size: usize) -> std::result::Result<&'a [u8], ChunkError> {
        if offset == SENTINEL {
            return Err(ChunkError::Absent);
        }
        let start = offset as usize;
        if start >= self.data.len() {
            return Err(ChunkError::OutOfBounds {
                offset,
                len: self.data.len(),
            });
        }
        let available = self.data.len() - start;
        if available < size {
            return Err(ChunkError::Truncated {
                offset,
                wanted: size,
                available,
            });
        }
        Ok(&self.data[start..start + size])
    }

    /// Read one byte
    pub fn read_u8(&self, offset: u32) -> std::result::Result<u8, ChunkError> {
        Ok(self.read_at(offset, 1)?[0])
    }

    /// Read a little-endian u32
    pub fn read_u32(&self, offset: u32) -> std::result::Result<u32, ChunkError> {
        let bytes = self.read_at(offset, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read `count` consecutive little-endian u16 values
    pub fn read_u16_array(
        &self,
        offset: u32,
        count: usize,
    ) -> std::result::Result<Vec<u16>, ChunkError> {
        let bytes = self.read_at(offset, count * 2)?;
        Ok(bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect())
    }

    /// Read `count` consecutive little-endian u32 values
    pub fn read_u32_array(
        &self,
        offset: u32,
        count: usize,
    ) -> std::result::Result<Vec<u32>, ChunkError> {
        let bytes = self.read_at(offset, count * 4)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|quad| u32::from_le_bytes([quad[0], quad[1], quad[2], quad[3]]))
            .collect())
    }

    /// Read and decode a fixed-size record
    pub fn read_record<R: Record>(&self, offset: u32) -> std::result::Result<R, ChunkError> {
        let bytes = self.read_at(offset, R::SIZE)?;
        R::parse(bytes)
            .map(|(_, record)| record)
            .map_err(|_| ChunkError::Truncated {
                offset,
                wanted: R::SIZE,
                available: bytes.len(),
            })
    }

    /// Validate the version chunk and read the header chunk that follows it
    ///
    /// Any failure here is fatal to the load.
    pub fn read_header(&self) -> Result<HeaderChunk> {
        let version: VersionChunk = self.read_record(0)?;
        if version.creator != IECS_MAGIC {
            return Err(Ps2SndError::InvalidMagic {
                found: version.creator,
            });
        }
        debug!(
            "HD version {}.{}, version chunk size {}",
            version.major, version.minor, version.chunk_size
        );

        let header_offset = version.chunk_size.max(MIN_VERSION_CHUNK_SIZE);
        Ok(self.read_record(header_offset)?)
    }

    /// Load and rebase the offset table of the chunk at `addr`
    ///
    /// Address `0` or the sentinel yields an empty table.
    pub fn load_offset_table(&self, addr: u32) -> std::result::Result<OffsetTable, ChunkError> {
        if addr == 0 || addr == SENTINEL {
            return Ok(OffsetTable::default());
        }

        let count_offset = addr.checked_add(12).ok_or(ChunkError::OutOfBounds {
            offset: addr,
            len: self.data.len(),
        })?;
        let count = self.read_u32(count_offset)?;
        if count > MAX_TABLE_ENTRIES {
            return Err(ChunkError::CorruptCount { addr, count });
        }

        let offsets = self.read_u32_array(count_offset + 4, count as usize + 1)?;
        Ok(OffsetTable::new(
            offsets
                .into_iter()
                .map(|off| if off == SENTINEL { off } else { off.wrapping_add(addr) })
                .collect(),
        ))
    }

    /// Load all four sub-tables; a broken table is logged and left empty
    pub fn load_tables(&self, header: &HeaderChunk) -> ChunkTables {
        let load = |name: &str, addr: u32| match self.load_offset_table(addr) {
            Ok(table) => table,
            Err(err) => {
                warn!("{} table at 0x{:08X} ignored: {}", name, addr, err);
                OffsetTable::default()
            }
        };

        let tables = ChunkTables {
            vag_infos: load("VAG info", header.vag_info_chunk_addr),
            samples: load("sample", header.sample_chunk_addr),
            sample_sets: load("sample set", header.sample_set_chunk_addr),
            programs: load("program", header.program_chunk_addr),
        };
        info!(
            "Loaded tables: {} programs, {} sample sets, {} samples, {} VAGs",
            tables.programs.len(),
            tables.sample_sets.len(),
            tables.samples.len(),
            tables.vag_infos.len()
        );
        tables
    }
}
