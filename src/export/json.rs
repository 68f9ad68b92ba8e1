//! JSON model writer
//!
//! Serializes the export model as-is, so any downstream container emitter can
//! consume it without linking this crate.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{ExportModel, SoundFontWriter};
use crate::{Ps2SndError, Result};

/// Writes an [`ExportModel`] as JSON
pub struct JsonWriter<W: Write> {
    writer: W,
    pretty: bool,
}

impl JsonWriter<BufWriter<File>> {
    /// Create (or truncate) a JSON file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Ok(JsonWriter::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonWriter<W> {
    /// Wrap any byte sink
    pub fn new(writer: W) -> Self {
        JsonWriter {
            writer,
            pretty: false,
        }
    }

    /// Indent the output
    pub fn pretty(mut self, enable: bool) -> Self {
        self.pretty = enable;
        self
    }

    /// Recover the underlying sink
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SoundFontWriter for JsonWriter<W> {
    fn write(&mut self, model: &ExportModel) -> Result<()> {
        let result = if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, model)
        } else {
            serde_json::to_writer(&mut self.writer, model)
        };
        result.map_err(|e| Ps2SndError::ExportError(format!("Failed to serialize model: {}", e)))?;
        self.writer.flush()?;
        Ok(())
    }
}
