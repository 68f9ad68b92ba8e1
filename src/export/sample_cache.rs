//! Sample Arena
//!
//! Zones refer to samples by index into an arena that lives for one export
//! run. The map keyed by BD offset guarantees each offset is decoded at most
//! once, including offsets whose decode produced nothing.

use std::collections::HashMap;

use super::ExportSample;

/// Arena slot of a decoded sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedSample {
    /// Index into the arena
    pub index: usize,
    /// The decoded sample loops
    pub looping: bool,
}

/// Arena of export samples keyed by BD offset
#[derive(Debug, Default)]
pub struct SampleCache {
    samples: Vec<ExportSample>,
    entries: HashMap<u32, Option<CachedSample>>,
}

impl SampleCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `bd_offset`, running `decode` only on the first request
    ///
    /// `decode` returns the sample and its loop flag, or `None` when the offset
    /// has nothing playable; that outcome is remembered too.
    pub fn get_or_insert_with<F>(&mut self, bd_offset: u32, decode: F) -> Option<CachedSample>
    where
        F: FnOnce() -> Option<(ExportSample, bool)>,
    {
        if let Some(entry) = self.entries.get(&bd_offset) {
            return *entry;
        }

        let entry = decode().map(|(sample, looping)| {
            self.samples.push(sample);
            CachedSample {
                index: self.samples.len() - 1,
                looping,
            }
        });
        self.entries.insert(bd_offset, entry);
        entry
    }

    /// Sample at an arena index
    pub fn get(&self, index: usize) -> Option<&ExportSample> {
        self.samples.get(index)
    }

    /// Number of samples in the arena
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the arena is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Hand the arena over to the export model
    pub fn into_samples(self) -> Vec<ExportSample> {
        self.samples
    }
}
