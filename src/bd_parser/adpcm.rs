//! VAG ADPCM Decoder
//!
//! 4-bit ADPCM as stored in BD files:
//! - 16-byte blocks encode 28 samples
//! - Byte 0: shift (bits 0-3) | filter (bits 4-6)
//! - Byte 1: loop flags
//! - Bytes 2-15: nibble pairs, low nibble first
//!
//! The two-sample prediction history is kept in `f64` and is never clamped;
//! only the emitted sample is saturated to `i16`. Clamping the feedback state
//! changes the output of loud blocks.

use serde::Serialize;

use super::{is_silence_terminator, BlockFlags, ADPCM_BLOCK_SIZE, SAMPLES_PER_BLOCK};

/// Sample rate assumed when none is known
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Largest filter index with its own coefficient pair
const MAX_FILTER: usize = 4;

/// Filter coefficients applied to the previous output
const FILTER_S1: [f64; 5] = [0.0, 0.9375, 1.796875, 1.53125, 1.90625];

/// Filter coefficients applied to the output before that
const FILTER_S2: [f64; 5] = [0.0, 0.0, -0.8125, -0.859375, -0.9375];

/// PCM decoded from one block run, with its loop region
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedSample {
    /// Signed 16-bit mono samples
    pub pcm: Vec<i16>,
    /// First sample of the loop region
    pub loop_start: u32,
    /// One past the last sample of the loop region
    pub loop_end: u32,
    /// A block carried the loop-repeat flag
    pub looping: bool,
    /// Playback rate in Hz
    pub sample_rate: u32,
}

impl DecodedSample {
    /// Empty sample at the given rate
    pub fn new(sample_rate: u32) -> Self {
        DecodedSample {
            pcm: Vec::new(),
            loop_start: 0,
            loop_end: 0,
            looping: false,
            sample_rate,
        }
    }

    /// Number of decoded samples
    pub fn len(&self) -> usize {
        self.pcm.len()
    }

    /// Whether nothing was decoded
    pub fn is_empty(&self) -> bool {
        self.pcm.is_empty()
    }

    /// Whether the loop region is usable for playback
    pub fn has_loop(&self) -> bool {
        self.looping && self.loop_end > self.loop_start
    }

    /// Duration in seconds at the sample's own rate
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.pcm.len() as f64 / self.sample_rate as f64
    }
}

impl Default for DecodedSample {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

/// Prediction history carried between nibbles and across blocks
#[derive(Debug, Clone, Copy, Default)]
struct Predictor {
    s1: f64,
    s2: f64,
}

impl Predictor {
    /// Feed one scaled nibble, return the emitted sample
    #[inline]
    fn next(&mut self, sample: f64, filter: usize) -> i16 {
        let value = sample + self.s1 * FILTER_S1[filter] + self.s2 * FILTER_S2[filter];
        self.s2 = self.s1;
        self.s1 = value;
        value.clamp(-32768.0, 32767.0) as i16
    }
}

/// Sign-extend a 4-bit nibble and apply the block shift
#[inline]
fn scale_nibble(nibble: u8, shift: i32) -> f64 {
    let value = ((nibble << 4) as i8 >> 4) as i32;
    if shift >= 0 {
        (value << shift) as f64
    } else {
        (value >> -shift) as f64
    }
}

/// Decode a block run into PCM
///
/// Trailing bytes that do not fill a whole block are ignored. When the run
/// loops but never marks its loop end, `loop_end` is the decoded length.
pub fn decode_adpcm(blocks: &[u8], sample_rate: u32) -> DecodedSample {
    let mut result = DecodedSample::new(sample_rate);
    if blocks.is_empty() {
        return result;
    }

    let mut pcm = Vec::with_capacity(blocks.len() / ADPCM_BLOCK_SIZE * SAMPLES_PER_BLOCK);
    let mut predictor = Predictor::default();

    for block in blocks.chunks_exact(ADPCM_BLOCK_SIZE) {
        let shift = 12 - (block[0] & 0x0F) as i32;
        let mut filter = ((block[0] >> 4) & 0x07) as usize;
        if filter > MAX_FILTER {
            filter = 0;
        }
        let flags = BlockFlags::from_byte(block[1]);

        if flags.contains(BlockFlags::LOOP_START) {
            result.loop_start = pcm.len() as u32;
        }
        if flags.contains(BlockFlags::LOOP_REPEAT) {
            result.looping = true;
        }
        if (flags.contains(BlockFlags::LOOP_END) || is_silence_terminator(block)) && result.looping
        {
            result.loop_end = (pcm.len() + SAMPLES_PER_BLOCK) as u32;
        }

        for &byte in &block[2..] {
            pcm.push(predictor.next(scale_nibble(byte & 0x0F, shift), filter));
            pcm.push(predictor.next(scale_nibble(byte >> 4, shift), filter));
        }
    }

    if result.loop_end == 0 {
        result.loop_end = pcm.len() as u32;
    }
    result.pcm = pcm;
    result
}
