//! WAV file export of a single decoded tone

use std::path::Path;

use log::info;

use crate::bd_parser::DecodedSample;
use crate::{Ps2SndError, Result};

/// Lay out a decoded sample as a player would hear it
///
/// The whole buffer plays once. Each extra loop restarts at `loop_start` and
/// runs to the end of the buffer; samples without a usable loop region play
/// once regardless of `loops`.
pub fn render_with_loops(decoded: &DecodedSample, loops: u32) -> Vec<i16> {
    let mut pcm = decoded.pcm.clone();
    if loops == 0 || !decoded.has_loop() {
        return pcm;
    }

    let start = (decoded.loop_start as usize).min(decoded.pcm.len());
    let tail = &decoded.pcm[start..];
    pcm.reserve(tail.len() * loops as usize);
    for _ in 0..loops {
        pcm.extend_from_slice(tail);
    }
    pcm
}

/// Write mono 16-bit PCM to a WAV file
pub fn write_wav_file(path: &Path, samples: &[i16], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| Ps2SndError::AudioFileError(format!("Failed to create WAV file: {}", e)))?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| Ps2SndError::AudioFileError(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| Ps2SndError::AudioFileError(format!("Failed to finalize WAV file: {}", e)))?;

    Ok(())
}

/// Export a decoded tone to WAV at its own sample rate
pub fn export_tone_to_wav<P: AsRef<Path>>(
    decoded: &DecodedSample,
    output_path: P,
    loops: u32,
) -> Result<()> {
    if decoded.is_empty() {
        return Err(Ps2SndError::AudioFileError(
            "Tone decoded to an empty sample".to_string(),
        ));
    }

    let pcm = render_with_loops(decoded, loops);
    info!(
        "Writing {} samples at {} Hz to {}",
        pcm.len(),
        decoded.sample_rate,
        output_path.as_ref().display()
    );
    write_wav_file(output_path.as_ref(), &pcm, decoded.sample_rate)
}
