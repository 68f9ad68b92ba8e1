//! HD/BD File Loader
//!
//! Locates the BD file that belongs to an HD file and loads both.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::bank::Bank;
use crate::bd_parser::BdFile;
use crate::hd_parser::parse_hd;
use crate::{Ps2SndError, Result};

/// Conventional BD path for an HD path
///
/// A trailing `.hd` (any case) becomes `.bd`; otherwise `.bd` is appended.
pub fn bd_path_for(hd_path: &Path) -> PathBuf {
    if let Some(name) = hd_path.file_name().and_then(|n| n.to_str()) {
        let cut = name.len().saturating_sub(3);
        let has_hd_ext = name.len() >= 3
            && name
                .get(cut..)
                .is_some_and(|ext| ext.eq_ignore_ascii_case(".hd"));
        if has_hd_ext {
            return hd_path.with_file_name(format!("{}.bd", &name[..cut]));
        }
    }

    let mut path: OsString = hd_path.as_os_str().to_owned();
    path.push(".bd");
    PathBuf::from(path)
}

/// Paths of a matched HD/BD pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankFiles {
    /// Header file
    pub hd: PathBuf,
    /// Sample data file
    pub bd: PathBuf,
}

impl BankFiles {
    /// Pair an HD file with its BD file
    ///
    /// `bd_override` replaces the conventional BD path. The BD file must exist.
    pub fn locate<P: AsRef<Path>>(hd: P, bd_override: Option<&Path>) -> Result<Self> {
        let hd = hd.as_ref().to_path_buf();
        let bd = match bd_override {
            Some(path) => path.to_path_buf(),
            None => bd_path_for(&hd),
        };
        if !bd.is_file() {
            return Err(Ps2SndError::MissingBdFile(bd));
        }
        Ok(BankFiles { hd, bd })
    }

    /// Load the BD data, then parse the HD header
    pub fn load(&self) -> Result<(Bank, BdFile)> {
        let bd = BdFile::load(&self.bd)?;
        let bank = load_hd(&self.hd)?;
        Ok((bank, bd))
    }
}

/// Read and parse an HD file
pub fn load_hd<P: AsRef<Path>>(path: P) -> Result<Bank> {
    let path = path.as_ref();
    let data = fs::read(path)
        .map_err(|e| format!("Failed to read HD file '{}': {}", path.display(), e))?;
    info!("Loading HD {} ({} bytes)", path.display(), data.len());
    parse_hd(&data)
}
