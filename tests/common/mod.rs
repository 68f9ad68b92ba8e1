//! Synthetic HD/BD bank builder shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

const SENTINEL: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone, Copy)]
pub struct SplitDef {
    pub set: u16,
    pub low: u8,
    pub high: u8,
    pub pan: u8,
    pub detune: i8,
}

pub fn split(set: u16, low: u8, high: u8) -> SplitDef {
    SplitDef {
        set,
        low,
        high,
        pan: 0x40,
        detune: 0,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SampleDef {
    pub vag: u16,
    pub note: u8,
    pub detune: i8,
    pub pan: u8,
    pub group: u8,
    pub adsr1: u16,
    pub adsr2: u16,
}

pub fn sample(vag: u16) -> SampleDef {
    SampleDef {
        vag,
        note: 60,
        detune: 0,
        pan: 0x40,
        group: 0,
        adsr1: 0x80FF,
        adsr2: 0x5FC0,
    }
}

/// Builds an HD header image chunk by chunk
#[derive(Debug, Default)]
pub struct HdBuilder {
    programs: Vec<Option<(u8, Vec<SplitDef>)>>,
    sets: Vec<Option<Vec<u16>>>,
    samples: Vec<SampleDef>,
    vags: Vec<(u32, u16)>,
}

impl HdBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program(mut self, pan: u8, splits: Vec<SplitDef>) -> Self {
        self.programs.push(Some((pan, splits)));
        self
    }

    pub fn empty_program_slot(mut self) -> Self {
        self.programs.push(None);
        self
    }

    pub fn set(mut self, samples: Vec<u16>) -> Self {
        self.sets.push(Some(samples));
        self
    }

    pub fn empty_set_slot(mut self) -> Self {
        self.sets.push(None);
        self
    }

    pub fn sample(mut self, def: SampleDef) -> Self {
        self.samples.push(def);
        self
    }

    pub fn vag(mut self, offset: u32, rate: u16) -> Self {
        self.vags.push((offset, rate));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = vec![0u8; 16 + 72];
        data[0..4].copy_from_slice(b"IECS");
        data[4..8].copy_from_slice(b"Vers");
        data[8..12].copy_from_slice(&16u32.to_le_bytes());
        data[16..20].copy_from_slice(b"IECS");
        data[20..24].copy_from_slice(b"Head");
        data[24..28].copy_from_slice(&72u32.to_le_bytes());

        let programs: Vec<Option<Vec<u8>>> = self
            .programs
            .iter()
            .map(|p| p.as_ref().map(|(pan, splits)| program_record(*pan, splits)))
            .collect();
        let sets: Vec<Option<Vec<u8>>> = self
            .sets
            .iter()
            .map(|s| {
                s.as_ref().map(|indices| {
                    let mut bytes = vec![0, 0, 0, indices.len() as u8];
                    for index in indices {
                        bytes.extend_from_slice(&index.to_le_bytes());
                    }
                    bytes
                })
            })
            .collect();
        let samples: Vec<Option<Vec<u8>>> =
            self.samples.iter().map(|s| Some(sample_record(s))).collect();
        let vags: Vec<Option<Vec<u8>>> = self
            .vags
            .iter()
            .map(|(offset, rate)| {
                let mut bytes = offset.to_le_bytes().to_vec();
                bytes.extend_from_slice(&rate.to_le_bytes());
                bytes.extend_from_slice(&[0, 0]);
                Some(bytes)
            })
            .collect();

        let addrs = [
            push_chunk(&mut data, b"Prog", &programs),
            push_chunk(&mut data, b"Sset", &sets),
            push_chunk(&mut data, b"Smpl", &samples),
            push_chunk(&mut data, b"Vagi", &vags),
        ];
        for (i, addr) in addrs.iter().enumerate() {
            let at = 16 + 20 + i * 4;
            data[at..at + 4].copy_from_slice(&addr.to_le_bytes());
        }
        data
    }
}

fn program_record(pan: u8, splits: &[SplitDef]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&14u32.to_le_bytes());
    bytes.extend_from_slice(&[splits.len() as u8, 20, 127, pan, 0, 0, 0, 0, 0, 0]);
    for s in splits {
        let mut block = [0u8; 20];
        block[0..2].copy_from_slice(&s.set.to_le_bytes());
        block[2] = s.low;
        block[4] = s.high;
        block[16] = 127;
        block[17] = s.pan;
        block[19] = s.detune as u8;
        bytes.extend_from_slice(&block);
    }
    bytes
}

fn sample_record(s: &SampleDef) -> Vec<u8> {
    let mut bytes = vec![0u8; 22];
    bytes[0..2].copy_from_slice(&s.vag.to_le_bytes());
    bytes[3] = 127;
    bytes[11] = s.note;
    bytes[12] = s.detune as u8;
    bytes[13] = s.pan;
    bytes[14] = s.group;
    bytes[16] = 127;
    bytes[18..20].copy_from_slice(&s.adsr1.to_le_bytes());
    bytes[20..22].copy_from_slice(&s.adsr2.to_le_bytes());
    bytes
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

/// One 16-byte ADPCM block
pub fn adpcm_block(header: u8, flags: u8, data: &[u8]) -> [u8; 16] {
    let mut block = [0u8; 16];
    block[0] = header;
    block[1] = flags;
    block[2..2 + data.len()].copy_from_slice(data);
    block
}

/// Write `name.hd` and `name.bd` into `dir`, returning the HD path
pub fn write_pair(dir: &Path, name: &str, hd: &[u8], bd: &[u8]) -> PathBuf {
    let hd_path = dir.join(format!("{}.hd", name));
    fs::write(&hd_path, hd).unwrap();
    fs::write(dir.join(format!("{}.bd", name)), bd).unwrap();
    hd_path
}
