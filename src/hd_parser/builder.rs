//! Bank Model Builder
//!
//! Walks the resolved offset tables and rebuilds the
//! program → split → sample set → sample → VAG hierarchy as [`Tone`]s.
//!
//! Resolution is lenient: an unresolved index, an empty slot or a truncated
//! record drops only the split or sample that referenced it. Reproducing the
//! behaviour of the console's own driver on inconsistent banks depends on
//! this; only the version/header records are fatal.

use log::debug;

use super::reader::{ChunkReader, ChunkTables};
use super::records::{ProgramParam, Record, SampleGroup, SampleParam, SplitBlock, VagInfoParam};
use crate::bank::{Bank, Program, Tone};

/// Splits per program above this count are treated as zero splits
pub const MAX_SPLITS: u8 = 128;

/// Samples per sample set are clamped to this count
pub const MAX_SET_SAMPLES: u8 = 16;

/// Center pan value
const PAN_CENTER: i32 = 0x40;

/// Convert a hardware pan byte to an offset from center
///
/// Values above 0x7F mirror back towards the left.
pub fn convert_pan(value: u8) -> i32 {
    if value > 0x7F {
        PAN_CENTER - (value as i32 - 0x7F)
    } else {
        value as i32 - PAN_CENTER
    }
}

/// Builds a [`Bank`] from an HD file's resolved tables
pub struct BankModelBuilder<'a> {
    reader: ChunkReader<'a>,
    tables: ChunkTables,
    samples: Vec<Option<SampleParam>>,
    vags: Vec<Option<VagInfoParam>>,
}

impl<'a> BankModelBuilder<'a> {
    /// Pre-read every sample and VAG record referenced by the tables
    pub fn new(reader: ChunkReader<'a>, tables: ChunkTables) -> Self {
        let samples = tables
            .samples
            .slots()
            .iter()
            .map(|&offset| reader.read_record::<SampleParam>(offset).ok())
            .collect();
        let vags = tables
            .vag_infos
            .slots()
            .iter()
            .map(|&offset| reader.read_record::<VagInfoParam>(offset).ok())
            .collect();

        BankModelBuilder {
            reader,
            tables,
            samples,
            vags,
        }
    }

    /// Walk the program table and build the bank
    pub fn build(&self) -> Bank {
        let mut bank = Bank::default();

        for (index, &offset) in self.tables.programs.slots().iter().enumerate() {
            if let Some(program) = self.build_program(index as u32, offset) {
                bank.programs.push(program);
            }
        }

        bank.valid = true;
        bank
    }

    fn build_program(&self, id: u32, offset: u32) -> Option<Program> {
        let param: ProgramParam = match self.reader.read_record(offset) {
            Ok(param) => param,
            Err(err) => {
                if !err.is_absent() {
                    debug!("Program {} skipped: {}", id, err);
                }
                return None;
            }
        };

        let mut program = Program::new(id);
        program.master_vol = param.volume;
        program.master_pan = param.panpot;

        let split_base = offset.wrapping_add(param.split_block_addr);
        let n_split = if param.n_split > MAX_SPLITS {
            0
        } else {
            param.n_split
        };

        for split_index in 0..n_split as u32 {
            let split_offset = split_base.wrapping_add(split_index * SplitBlock::SIZE as u32);
            let split: SplitBlock = match self.reader.read_record(split_offset) {
                Ok(split) => split,
                Err(err) => {
                    debug!("Program {} split {}: {}, stopping", id, split_index, err);
                    break;
                }
            };
            self.add_split_tones(&mut program, &param, &split);
        }

        program.is_layered = program.tones.len() > 1;
        Some(program)
    }

    fn add_split_tones(&self, program: &mut Program, param: &ProgramParam, split: &SplitBlock) {
        let Some(set_addr) = self
            .tables
            .sample_sets
            .resolve(split.sample_set_index as usize)
        else {
            debug!(
                "Program {}: sample set {} unresolved",
                program.id, split.sample_set_index
            );
            return;
        };

        let Ok(n_samples) = self.reader.read_u8(set_addr.wrapping_add(3)) else {
            return;
        };
        let n_samples = n_samples.min(MAX_SET_SAMPLES) as usize;
        let Ok(indices) = self
            .reader
            .read_u16_array(set_addr.wrapping_add(4), n_samples)
        else {
            return;
        };

        for sample_index in indices {
            let Some(sample) = self.sample(sample_index) else {
                debug!("Program {}: sample {} unresolved", program.id, sample_index);
                continue;
            };
            let Some(vag) = self.vag(sample.vag_index) else {
                debug!("Program {}: VAG {} unresolved", program.id, sample.vag_index);
                continue;
            };
            program.tones.push(make_tone(param, split, sample, vag));
        }
    }

    fn sample(&self, index: u16) -> Option<&SampleParam> {
        self.samples.get(index as usize)?.as_ref()
    }

    fn vag(&self, index: u16) -> Option<&VagInfoParam> {
        self.vags.get(index as usize)?.as_ref()
    }
}

fn make_tone(
    param: &ProgramParam,
    split: &SplitBlock,
    sample: &SampleParam,
    vag: &VagInfoParam,
) -> Tone {
    let max_note = if split.range_high < split.range_low {
        0x7F
    } else {
        split.range_high
    };
    let pan = PAN_CENTER
        + convert_pan(sample.panpot)
        + convert_pan(param.panpot)
        + convert_pan(split.panpot);

    Tone {
        min_note: split.range_low,
        max_note,
        root_key: sample.base_note,
        pitch_fine: split.detune.wrapping_add(sample.detune),
        pan: pan.clamp(0, 127) as u8,
        volume: sample.volume,
        adsr1: sample.adsr1,
        adsr2: sample.adsr2,
        bd_offset: vag.vag_offset,
        sample_rate: vag.sample_rate as u32,
        reverb_enabled: SampleGroup::from_byte(sample.group).is_reverb_enabled(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hd_parser::reader::SENTINEL;

    #[derive(Clone, Copy)]
    struct SplitSpec {
        set: u16,
        low: u8,
        high: u8,
        pan: u8,
        detune: i8,
    }

    #[derive(Clone, Copy)]
    struct SampleSpec {
        vag: u16,
        note: u8,
        detune: i8,
        pan: u8,
        group: u8,
    }

    fn split(set: u16, low: u8, high: u8) -> SplitSpec {
        SplitSpec {
            set,
            low,
            high,
            pan: 0x40,
            detune: 0,
        }
    }

    fn sample(vag: u16) -> SampleSpec {
        SampleSpec {
            vag,
            note: 60,
            detune: 0,
            pan: 0x40,
            group: 0,
        }
    }

    fn push_chunk(data: &mut Vec<u8>, tag: &[u8; 4], records: &[Option<Vec<u8>>]) -> u32 {
        let addr = data.len() as u32;
        let table_len = 16 + (records.len() + 1) * 4;
        let mut body = Vec::new();
        let mut offsets = Vec::new();
        for record in records {
            match record {
                Some(bytes) => {
                    offsets.push((table_len + body.len()) as u32);
                    body.extend_from_slice(bytes);
                }
                None => offsets.push(SENTINEL),
            }
        }
        offsets.push(SENTINEL);

        data.extend_from_slice(b"IECS");
        data.extend_from_slice(tag);
        data.extend_from_slice(&((table_len + body.len()) as u32).to_le_bytes());
        data.extend_from_slice(&(records.len() as u32).to_le_bytes());
        for offset in offsets {
            data.extend_from_slice(&offset.to_le_bytes());
        }
        data.extend_from_slice(&body);
        addr
    }

    fn program_bytes(pan: u8, n_split: u8, splits: &[SplitSpec]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&14u32.to_le_bytes());
        bytes.extend_from_slice(&[n_split, 20, 100, pan, 0, 0, 0, 0, 0, 0]);
        for s in splits {
            let mut block = [0u8; 20];
            block[0..2].copy_from_slice(&s.set.to_le_bytes());
            block[2] = s.low;
            block[4] = s.high;
            block[17] = s.pan;
            block[19] = s.detune as u8;
            bytes.extend_from_slice(&block);
        }
        bytes
    }

    fn build_hd(
        programs: &[Option<(u8, Vec<SplitSpec>)>],
        sets: &[Option<Vec<u16>>],
        samples: &[SampleSpec],
        vags: &[u32],
    ) -> Vec<u8> {
        let mut data = vec![0u8; 16 + 72];
        data[0..4].copy_from_slice(b"IECS");
        data[8..12].copy_from_slice(&16u32.to_le_bytes());

        let prog_records: Vec<Option<Vec<u8>>> = programs
            .iter()
            .map(|p| {
                p.as_ref()
                    .map(|(pan, splits)| program_bytes(*pan, splits.len() as u8, splits))
            })
            .collect();
        let set_records: Vec<Option<Vec<u8>>> = sets
            .iter()
            .map(|set| {
                set.as_ref().map(|indices| {
                    let mut bytes = vec![0, 0, 0, indices.len() as u8];
                    for i in indices {
                        bytes.extend_from_slice(&i.to_le_bytes());
                    }
                    bytes
                })
            })
            .collect();
        let sample_records: Vec<Option<Vec<u8>>> = samples
            .iter()
            .map(|s| {
                let mut bytes = vec![0u8; 22];
                bytes[0..2].copy_from_slice(&s.vag.to_le_bytes());
                bytes[11] = s.note;
                bytes[12] = s.detune as u8;
                bytes[13] = s.pan;
                bytes[14] = s.group;
                bytes[16] = 0x7F;
                bytes[18..20].copy_from_slice(&0x80FFu16.to_le_bytes());
                bytes[20..22].copy_from_slice(&0x5FC8u16.to_le_bytes());
                Some(bytes)
            })
            .collect();
        let vag_records: Vec<Option<Vec<u8>>> = vags
            .iter()
            .map(|offset| {
                let mut bytes = offset.to_le_bytes().to_vec();
                bytes.extend_from_slice(&22_050u16.to_le_bytes());
                bytes.extend_from_slice(&[0, 0]);
                Some(bytes)
            })
            .collect();

        let prog_addr = push_chunk(&mut data, b"Prog", &prog_records);
        let set_addr = push_chunk(&mut data, b"Sset", &set_records);
        let smp_addr = push_chunk(&mut data, b"Smpl", &sample_records);
        let vag_addr = push_chunk(&mut data, b"Vagi", &vag_records);

        for (i, addr) in [prog_addr, set_addr, smp_addr, vag_addr].iter().enumerate() {
            let at = 16 + 20 + i * 4;
            data[at..at + 4].copy_from_slice(&addr.to_le_bytes());
        }
        data
    }

    fn build_bank(data: &[u8]) -> Bank {
        let reader = ChunkReader::new(data);
        let header = reader.read_header().unwrap();
        let tables = reader.load_tables(&header);
        BankModelBuilder::new(reader, tables).build()
    }

    #[test]
    fn test_convert_pan() {
        assert_eq!(convert_pan(0x40), 0);
        assert_eq!(convert_pan(0x00), -64);
        assert_eq!(convert_pan(0x7F), 63);
        assert_eq!(convert_pan(0x80), 63);
        assert_eq!(convert_pan(0xFF), -64);
    }

    #[test]
    fn test_single_tone_program() {
        let data = build_hd(
            &[Some((0x40, vec![split(0, 36, 72)]))],
            &[Some(vec![0])],
            &[sample(0)],
            &[0x1000],
        );
        let bank = build_bank(&data);

        assert!(bank.valid);
        assert_eq!(bank.programs.len(), 1);
        let program = &bank.programs[0];
        assert_eq!(program.id, 0);
        assert_eq!(program.master_vol, 100);
        assert!(!program.is_layered);
        assert_eq!(program.tones.len(), 1);

        let tone = program.tones[0];
        assert_eq!((tone.min_note, tone.max_note), (36, 72));
        assert_eq!(tone.root_key, 60);
        assert_eq!(tone.pan, 64);
        assert_eq!(tone.bd_offset, 0x1000);
        assert_eq!(tone.sample_rate, 22_050);
        assert_eq!(tone.adsr1, 0x80FF);
        assert_eq!(tone.adsr2, 0x5FC8);
        assert!(!tone.reverb_enabled);
    }

    #[test]
    fn test_absent_program_slot_skipped() {
        let data = build_hd(
            &[None, Some((0x40, vec![split(0, 0, 127)]))],
            &[Some(vec![0])],
            &[sample(0)],
            &[0],
        );
        let bank = build_bank(&data);
        assert_eq!(bank.programs.len(), 1);
        assert_eq!(bank.programs[0].id, 1);
        assert_eq!(bank.programs[0].name, "Program 1");
    }

    #[test]
    fn test_inverted_range_becomes_full_high() {
        let data = build_hd(
            &[Some((0x40, vec![split(0, 60, 40)]))],
            &[Some(vec![0])],
            &[sample(0)],
            &[0],
        );
        let tone = build_bank(&data).programs[0].tones[0];
        assert_eq!((tone.min_note, tone.max_note), (60, 127));
    }

    #[test]
    fn test_pan_stages_are_additive_and_clamped() {
        let mut left = split(0, 0, 127);
        left.pan = 0x20; // -32
        let mut smp = sample(0);
        smp.pan = 0x10; // -48
        let data = build_hd(&[Some((0x40, vec![left]))], &[Some(vec![0])], &[smp], &[0]);
        assert_eq!(build_bank(&data).programs[0].tones[0].pan, 0);

        let mut right = split(0, 0, 127);
        right.pan = 0x50; // +16
        let mut smp = sample(0);
        smp.pan = 0x48; // +8
        let data = build_hd(&[Some((0x44, vec![right]))], &[Some(vec![0])], &[smp], &[0]);
        assert_eq!(build_bank(&data).programs[0].tones[0].pan, 64 + 16 + 8 + 4);
    }

    #[test]
    fn test_detune_wraps() {
        let mut s = split(0, 0, 127);
        s.detune = 100;
        let mut smp = sample(0);
        smp.detune = 100;
        let data = build_hd(&[Some((0x40, vec![s]))], &[Some(vec![0])], &[smp], &[0]);
        assert_eq!(build_bank(&data).programs[0].tones[0].pitch_fine, 100i8.wrapping_add(100));
    }

    #[test]
    fn test_reverb_group_bits() {
        for (group, expected) in [(0x00, false), (0x04, true), (0x08, true), (0x03, false)] {
            let mut smp = sample(0);
            smp.group = group;
            let data = build_hd(
                &[Some((0x40, vec![split(0, 0, 127)]))],
                &[Some(vec![0])],
                &[smp],
                &[0],
            );
            assert_eq!(
                build_bank(&data).programs[0].tones[0].reverb_enabled,
                expected,
                "group 0x{:02X}",
                group
            );
        }
    }

    #[test]
    fn test_unresolved_references_skip_only_that_tone() {
        // Split 0 points at a missing set, split 1 at an absent set slot,
        // split 2 at a set with one bad sample index and one sample whose VAG is missing.
        let data = build_hd(
            &[Some((
                0x40,
                vec![split(9, 0, 10), split(1, 11, 20), split(0, 21, 30)],
            ))],
            &[Some(vec![0, 7, 1]), None],
            &[sample(0), sample(5)],
            &[0x200],
        );
        let bank = build_bank(&data);
        let program = &bank.programs[0];
        assert_eq!(program.tones.len(), 1);
        assert_eq!(program.tones[0].min_note, 21);
        assert_eq!(program.tones[0].bd_offset, 0x200);
        assert!(!program.is_layered);
    }

    #[test]
    fn test_layered_program() {
        let data = build_hd(
            &[Some((0x40, vec![split(0, 0, 127)]))],
            &[Some(vec![0, 1])],
            &[sample(0), sample(1)],
            &[0x00, 0x40],
        );
        let program = &build_bank(&data).programs[0];
        assert_eq!(program.tones.len(), 2);
        assert!(program.is_layered);
        assert_eq!(program.tones[0].bd_offset, 0x00);
        assert_eq!(program.tones[1].bd_offset, 0x40);
    }

    #[test]
    fn test_set_sample_count_clamped() {
        let indices: Vec<u16> = (0..20).collect();
        let samples: Vec<SampleSpec> = (0..20).map(sample).collect();
        let vags: Vec<u32> = (0..20).map(|i| i * 0x10).collect();
        let data = build_hd(
            &[Some((0x40, vec![split(0, 0, 127)]))],
            &[Some(indices)],
            &samples,
            &vags,
        );
        let program = &build_bank(&data).programs[0];
        assert_eq!(program.tones.len(), MAX_SET_SAMPLES as usize);
        assert_eq!(program.tones[15].bd_offset, 15 * 0x10);
    }

    #[test]
    fn test_oversized_split_count_means_no_splits() {
        let mut data = build_hd(
            &[Some((0x40, vec![split(0, 0, 127)]))],
            &[Some(vec![0])],
            &[sample(0)],
            &[0],
        );
        // Patch n_split of the only program record
        let reader = ChunkReader::new(&data);
        let header = reader.read_header().unwrap();
        let prog_offset = reader
            .load_offset_table(header.program_chunk_addr)
            .unwrap()
            .resolve(0)
            .unwrap() as usize;
        data[prog_offset + 4] = 200;

        let bank = build_bank(&data);
        assert_eq!(bank.programs.len(), 1);
        assert!(bank.programs[0].tones.is_empty());
    }
}
