//! ADPCM Block Run Extraction
//!
//! A sample in the BD file has no length field. Its extent is found by
//! walking 16-byte blocks from the VAG offset until one carries the end flag.

use super::{is_silence_terminator, BlockFlags, ADPCM_BLOCK_SIZE, MAX_EXTRACT_BYTES};

/// Copy the block run starting at `start` out of the BD data
///
/// The walk stops after a block with [`BlockFlags::LOOP_END`] set or after the
/// silence terminator block, when the next block would run past the end of the
/// data, or once more than [`MAX_EXTRACT_BYTES`] have been collected. Returns an
/// empty vector when `start` is out of bounds.
pub fn extract_adpcm_blocks(data: &[u8], start: usize) -> Vec<u8> {
    let mut blocks = Vec::new();
    if start >= data.len() {
        return blocks;
    }

    let mut cursor = start;
    while cursor + ADPCM_BLOCK_SIZE <= data.len() {
        let block = &data[cursor..cursor + ADPCM_BLOCK_SIZE];
        blocks.extend_from_slice(block);
        cursor += ADPCM_BLOCK_SIZE;

        let flags = BlockFlags::from_byte(block[1]);
        if flags.contains(BlockFlags::LOOP_END) || is_silence_terminator(block) {
            break;
        }
        if blocks.len() > MAX_EXTRACT_BYTES {
            break;
        }
    }

    blocks
}
