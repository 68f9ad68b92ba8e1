//! Instrument Mapper
//!
//! One instrument per program, one zone per tone. Two adjacent tones of a
//! layered program with identical key ranges form a stereo pair and are panned
//! hard left/right. Envelope generators come from running the ADSR simulator
//! on the tone's register pair.

use log::{debug, info};

use super::sample_cache::SampleCache;
use super::{
    ExportModel, ExportOptions, ExportSample, Generator, Instrument, Preset, SampleMode, Zone,
};
use crate::bank::{Bank, Program, Tone};
use crate::bd_parser::{BdFile, DecodedSample};
use crate::envelope::{simulate_timecents, AdsrPhase};

/// Pan generator range limit
const PAN_LIMIT: i32 = 500;

/// Pan generator units per hardware pan step
const PAN_SCALE: i32 = 10;

/// Attenuation per sustain level step, in centibels
const SUSTAIN_STEP_CB: u16 = 66;

/// Attenuation used for sustain level 0
const SUSTAIN_LEVEL_ZERO_CB: u16 = 1440;

/// Provides decoded PCM for a BD offset
pub trait SampleSource {
    /// Extract and decode the sample at `bd_offset`
    fn decode(&self, bd_offset: u32, sample_rate: u32) -> DecodedSample;
}

impl SampleSource for BdFile {
    fn decode(&self, bd_offset: u32, sample_rate: u32) -> DecodedSample {
        self.decode_at(bd_offset, sample_rate)
    }
}

/// Pan generator for a 0..=127 tone pan
pub fn pan_generator(pan: u8) -> i16 {
    ((pan as i32 - 64) * PAN_SCALE).clamp(-PAN_LIMIT, PAN_LIMIT) as i16
}

/// Sustain attenuation for a combined ADSR register
pub fn sustain_attenuation(reg: u32) -> u16 {
    match (reg & 0x0F) as u16 {
        0 => SUSTAIN_LEVEL_ZERO_CB,
        level => (15 - level) * SUSTAIN_STEP_CB,
    }
}

/// Loop region of a non-empty decoded sample, kept strictly inside the PCM
pub fn loop_region(decoded: &DecodedSample) -> (u32, u32) {
    let len = decoded.pcm.len() as u32;
    let start = decoded.loop_start;
    let mut end = if decoded.loop_end > start {
        decoded.loop_end
    } else {
        len
    };
    if end >= len {
        end = len.saturating_sub(1);
    }
    (start, end)
}

/// Builds an [`ExportModel`] from a bank
pub struct InstrumentMapper<'a, S: SampleSource + ?Sized> {
    source: &'a S,
    options: &'a ExportOptions,
    cache: SampleCache,
}

impl<'a, S: SampleSource + ?Sized> InstrumentMapper<'a, S> {
    /// Create a mapper reading samples from `source`
    pub fn new(source: &'a S, options: &'a ExportOptions) -> Self {
        InstrumentMapper {
            source,
            options,
            cache: SampleCache::new(),
        }
    }

    /// Map every program of the bank
    pub fn map_bank(mut self, bank: &Bank) -> ExportModel {
        let mut instruments = Vec::with_capacity(bank.programs.len());
        let mut presets = Vec::with_capacity(bank.programs.len());

        for program in &bank.programs {
            instruments.push(self.map_program(program));
            presets.push(Preset {
                name: format!("Preset {}", program.id),
                preset: program.id,
                bank: 0,
                instrument: instruments.len() - 1,
                key_range: (0, 127),
            });
        }

        let samples = self.cache.into_samples();
        info!(
            "Mapped {} instruments, {} samples",
            instruments.len(),
            samples.len()
        );

        ExportModel {
            bank_name: self.options.bank_name.clone(),
            sound_engine: self.options.sound_engine.clone(),
            rom_name: self.options.rom_name.clone(),
            samples,
            instruments,
            presets,
        }
    }

    /// Map one program to an instrument
    pub fn map_program(&mut self, program: &Program) -> Instrument {
        let mut zones = Vec::new();
        let tones = &program.tones;
        let mut i = 0;

        while i < tones.len() {
            let tone = &tones[i];
            let partner = if program.is_layered {
                tones
                    .get(i + 1)
                    .filter(|next| next.min_note == tone.min_note && next.max_note == tone.max_note)
            } else {
                None
            };

            match partner {
                Some(right) => {
                    self.push_zone(&mut zones, tone, Some(-PAN_LIMIT as i16));
                    self.push_zone(&mut zones, right, Some(PAN_LIMIT as i16));
                    i += 2;
                }
                None => {
                    self.push_zone(&mut zones, tone, None);
                    i += 1;
                }
            }
        }

        Instrument {
            name: program.name.clone(),
            zones,
        }
    }

    fn push_zone(&mut self, zones: &mut Vec<Zone>, tone: &Tone, forced_pan: Option<i16>) {
        let source = self.source;
        let default_root = self.options.default_root_key;
        let cached = self.cache.get_or_insert_with(tone.bd_offset, || {
            let decoded = source.decode(tone.bd_offset, tone.sample_rate);
            if decoded.is_empty() {
                return None;
            }
            let (loop_start, loop_end) = loop_region(&decoded);
            let looping = decoded.looping;
            let sample = ExportSample {
                name: format!("Smp_{}", tone.bd_offset),
                loop_start,
                loop_end,
                sample_rate: decoded.sample_rate,
                root_key: if tone.root_key > 0 {
                    tone.root_key
                } else {
                    default_root
                },
                fine_tune: tone.pitch_fine,
                pcm: decoded.pcm,
            };
            Some((sample, looping))
        });

        let Some(cached) = cached else {
            debug!("No PCM at BD offset 0x{:08X}, zone skipped", tone.bd_offset);
            return;
        };

        let (low, high) = if tone.min_note > tone.max_note {
            (tone.max_note, tone.min_note)
        } else {
            (tone.min_note, tone.max_note)
        };
        let reg = tone.adsr_register();
        let mode = if cached.looping {
            SampleMode::LoopContinuously
        } else {
            SampleMode::NoLoop
        };

        zones.push(Zone {
            sample: cached.index,
            generators: vec![
                Generator::SampleModes(mode),
                Generator::KeyRange { low, high },
                Generator::Pan(forced_pan.unwrap_or_else(|| pan_generator(tone.pan))),
                Generator::AttackVolEnv(simulate_timecents(reg, AdsrPhase::Attack)),
                Generator::DecayVolEnv(simulate_timecents(reg, AdsrPhase::Decay)),
                Generator::ReleaseVolEnv(simulate_timecents(reg, AdsrPhase::Release)),
                Generator::SustainVolEnv(sustain_attenuation(reg)),
            ],
        });
    }
}
