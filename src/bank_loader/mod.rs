//! Bank File Loader Domain
//!
//! Handles file I/O for HD/BD pairs: BD path resolution next to the HD file,
//! and loading both halves into a [`Bank`] and a [`BdFile`].

pub mod loader;

pub use loader::{bd_path_for, load_hd, BankFiles};

use std::path::Path;

use crate::bank::Bank;
use crate::bd_parser::BdFile;
use crate::Result;

/// Convenience function to load an HD file and its BD file from disk
///
/// Without `bd`, the BD file is looked up next to the HD file.
pub fn load_bank_pair<P: AsRef<Path>>(hd: P, bd: Option<&Path>) -> Result<(Bank, BdFile)> {
    BankFiles::locate(hd, bd)?.load()
}
