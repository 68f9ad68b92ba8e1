//! HD/BD pair → bank → decoded PCM → export model, through the public API.

mod common;

use std::cell::Cell;
use std::fs;

use common::{adpcm_block, sample, split, write_pair, HdBuilder};
use ps2snd::bank_loader::load_bank_pair;
use ps2snd::export::json::JsonWriter;
use ps2snd::export::{
    export_bank, ExportOptions, Generator, InstrumentMapper, SampleMode, SampleSource,
};
use ps2snd::{parse_hd, BdFile, DecodedSample, Ps2SndError};

/// BD image with three samples:
/// - 0x00: two blocks, end flag on the second, no loop
/// - 0x20: three blocks looping from the first
/// - 0x50: one block with the end flag
fn bd_image() -> Vec<u8> {
    let mut bd = Vec::new();
    bd.extend_from_slice(&adpcm_block(0x00, 0x00, &[0x11; 14]));
    bd.extend_from_slice(&adpcm_block(0x00, 0x01, &[0x22; 14]));
    bd.extend_from_slice(&adpcm_block(0x00, 0x04, &[0x33; 14]));
    bd.extend_from_slice(&adpcm_block(0x00, 0x02, &[0x44; 14]));
    bd.extend_from_slice(&adpcm_block(0x00, 0x03, &[0x55; 14]));
    bd.extend_from_slice(&adpcm_block(0x00, 0x01, &[0x66; 14]));
    bd
}

struct CountingSource<'a> {
    bd: &'a BdFile,
    calls: Cell<usize>,
}

impl SampleSource for CountingSource<'_> {
    fn decode(&self, bd_offset: u32, sample_rate: u32) -> DecodedSample {
        self.calls.set(self.calls.get() + 1);
        self.bd.decode_at(bd_offset, sample_rate)
    }
}

#[test]
fn test_single_tone_bank_from_files() {
    let hd = HdBuilder::new()
        .program(0x40, vec![split(0, 0, 127)])
        .set(vec![0])
        .sample(sample(0))
        .vag(0, 22_050)
        .build();
    let dir = tempfile::tempdir().unwrap();
    let hd_path = write_pair(dir.path(), "stage1", &hd, &bd_image());

    let (bank, bd) = load_bank_pair(&hd_path, None).unwrap();
    assert!(bank.valid);
    assert_eq!(bank.programs.len(), 1);
    let tone = &bank.programs[0].tones[0];
    assert_eq!((tone.min_note, tone.max_note), (0, 127));
    assert_eq!(tone.root_key, 60);
    assert_eq!(tone.pan, 64);
    assert_eq!(tone.bd_offset, 0);
    assert_eq!(tone.sample_rate, 22_050);

    let decoded = bd.decode_tone(tone);
    assert_eq!(decoded.len(), 56);
    assert!(!decoded.looping);
    assert_eq!(decoded.sample_rate, 22_050);

    let out = dir.path().join("stage1.json");
    let mut writer = JsonWriter::create(&out).unwrap();
    let model = export_bank(&bank, &bd, &ExportOptions::new().bank_name("Stage 1"), &mut writer)
        .unwrap();
    assert_eq!(model.instruments.len(), 1);
    assert_eq!(model.instruments[0].zones.len(), 1);
    assert_eq!(model.presets.len(), 1);
    assert_eq!(model.samples.len(), 1);
    assert_eq!(model.samples[0].pcm.len(), 56);

    let zone = &model.instruments[0].zones[0];
    assert_eq!(zone.sample_mode(), Some(SampleMode::NoLoop));
    assert_eq!(zone.key_range(), Some((0, 127)));
    assert_eq!(zone.pan(), Some(0));

    drop(writer);
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["bank_name"], "Stage 1");
    assert_eq!(json["instruments"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(json["presets"][0]["preset"], 0);
    assert_eq!(json["samples"][0]["pcm"].as_array().map(|a| a.len()), Some(56));
}

#[test]
fn test_looping_sample_exports_loop_region() {
    let hd = HdBuilder::new()
        .program(0x40, vec![split(0, 0, 127)])
        .set(vec![0])
        .sample(sample(0))
        .vag(0x20, 44_100)
        .build();
    let bank = parse_hd(&hd).unwrap();
    let bd = BdFile::from_bytes(bd_image());

    let decoded = bd.decode_tone(&bank.programs[0].tones[0]);
    assert!(decoded.looping);
    assert_eq!(decoded.len(), 84);

    let options = ExportOptions::default();
    let model = InstrumentMapper::new(&bd, &options).map_bank(&bank);
    let sample = &model.samples[0];
    assert_eq!((sample.loop_start, sample.loop_end), (0, 83));
    assert_eq!(
        model.instruments[0].zones[0].sample_mode(),
        Some(SampleMode::LoopContinuously)
    );
}

#[test]
fn test_stereo_pair_is_panned_hard() {
    let hd = HdBuilder::new()
        .program(0x40, vec![split(0, 36, 72)])
        .set(vec![0, 1])
        .sample(sample(0))
        .sample(sample(1))
        .vag(0x00, 44_100)
        .vag(0x50, 44_100)
        .build();
    let bank = parse_hd(&hd).unwrap();
    let program = &bank.programs[0];
    assert!(program.is_layered);
    assert_eq!(program.tones.len(), 2);

    let bd = BdFile::from_bytes(bd_image());
    let options = ExportOptions::default();
    let model = InstrumentMapper::new(&bd, &options).map_bank(&bank);
    let pans: Vec<_> = model.instruments[0].zones.iter().map(|z| z.pan()).collect();
    assert_eq!(pans, vec![Some(-500), Some(500)]);
    assert_eq!(model.samples.len(), 2);
}

#[test]
fn test_shared_offset_decoded_once() {
    // Three samples, two VAG entries, one BD offset
    let hd = HdBuilder::new()
        .program(0x40, vec![split(0, 0, 60), split(1, 61, 127)])
        .program(0x40, vec![split(0, 0, 127)])
        .set(vec![0, 1])
        .set(vec![2])
        .sample(sample(0))
        .sample(sample(1))
        .sample(sample(0))
        .vag(0x00, 44_100)
        .vag(0x00, 32_000)
        .build();
    let bank = parse_hd(&hd).unwrap();
    assert_eq!(bank.tone_count(), 5);

    let bd = BdFile::from_bytes(bd_image());
    let source = CountingSource {
        bd: &bd,
        calls: Cell::new(0),
    };
    let options = ExportOptions::default();
    let model = InstrumentMapper::new(&source, &options).map_bank(&bank);

    assert_eq!(source.calls.get(), 1);
    assert_eq!(model.samples.len(), 1);
    let refs: Vec<usize> = model
        .instruments
        .iter()
        .flat_map(|inst| inst.zones.iter().map(|z| z.sample))
        .collect();
    assert_eq!(refs, vec![0; 5]);
}

#[test]
fn test_broken_references_drop_only_their_tones() {
    let hd = HdBuilder::new()
        .empty_program_slot()
        .program(0x40, vec![split(0, 0, 40), split(5, 41, 80), split(1, 81, 127)])
        .set(vec![0, 7])
        .empty_set_slot()
        .sample(sample(0))
        .vag(0x00, 44_100)
        .build();
    let bank = parse_hd(&hd).unwrap();

    assert!(bank.valid);
    assert_eq!(bank.programs.len(), 1);
    let program = &bank.programs[0];
    assert_eq!(program.id, 1);
    assert_eq!(program.tones.len(), 1);
    assert_eq!((program.tones[0].min_note, program.tones[0].max_note), (0, 40));

    let bd = BdFile::from_bytes(bd_image());
    let options = ExportOptions::default();
    let model = InstrumentMapper::new(&bd, &options).map_bank(&bank);
    assert_eq!(model.presets[0].preset, 1);
    assert_eq!(model.instruments[0].zones.len(), 1);
}

#[test]
fn test_tone_outside_bd_is_skipped_at_export() {
    let hd = HdBuilder::new()
        .program(0x40, vec![split(0, 0, 60), split(1, 61, 127)])
        .set(vec![0])
        .set(vec![1])
        .sample(sample(0))
        .sample(sample(1))
        .vag(0x00, 44_100)
        .vag(0x10_0000, 44_100)
        .build();
    let bank = parse_hd(&hd).unwrap();
    assert_eq!(bank.tone_count(), 2);

    let bd = BdFile::from_bytes(bd_image());
    let options = ExportOptions::default();
    let model = InstrumentMapper::new(&bd, &options).map_bank(&bank);
    let zones = &model.instruments[0].zones;
    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0].key_range(), Some((0, 60)));
    assert_eq!(model.presets.len(), 1);
}

#[test]
fn test_envelope_generators_follow_registers() {
    let mut def = sample(0);
    // Linear attack rate 0x7F is instant; sustain level 0xF means no attenuation
    def.adsr1 = 0x7F0F;
    def.adsr2 = 0x0000;
    let hd = HdBuilder::new()
        .program(0x40, vec![split(0, 0, 127)])
        .set(vec![0])
        .sample(def)
        .vag(0x00, 44_100)
        .build();
    let bank = parse_hd(&hd).unwrap();

    let bd = BdFile::from_bytes(bd_image());
    let options = ExportOptions::default();
    let model = InstrumentMapper::new(&bd, &options).map_bank(&bank);
    let generators = &model.instruments[0].zones[0].generators;
    assert!(generators.contains(&Generator::AttackVolEnv(ps2snd::TIMECENTS_INSTANT)));
    assert!(generators.contains(&Generator::SustainVolEnv(0)));
}

#[test]
fn test_missing_bd_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let hd_path = dir.path().join("lonely.hd");
    fs::write(&hd_path, HdBuilder::new().build()).unwrap();

    match load_bank_pair(&hd_path, None) {
        Err(Ps2SndError::MissingBdFile(path)) => assert_eq!(path, dir.path().join("lonely.bd")),
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}
