//! Patch directory scanning.
//!
//! Image files are named `<id>.<ext>` or `<id>_<version>.<ext>`. A pool
//! directory is listed once and turned into [`PatchFile`]s which
//! [`Engine::load_patches`] then writes to the store.
//!
//! [`Engine::load_patches`]: crate::Engine::load_patches

use std::{fs, path::Path};

use crate::{EngineError, Patch, PatchId, PatchKind, ResultEngine};

/// Identity parsed from one image filename.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PatchFile {
    pub base_id: i64,
    pub version: i32,
}

impl PatchFile {
    /// Fails when `base_id` has no packed id.
    pub fn into_patch(self, kind: PatchKind) -> ResultEngine<Patch> {
        if !(0..=PatchId::MAX_SEQ).contains(&self.base_id) {
            return Err(EngineError::InvalidFilename(format!(
                "patch number {} out of range",
                self.base_id
            )));
        }
        let id = match kind {
            PatchKind::Real => PatchId::real(self.base_id),
            PatchKind::Fake => PatchId::fake(self.base_id),
        };
        Ok(Patch::new(id, self.version))
    }
}

/// Result of listing a pool directory.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PatchScan {
    /// Parsed files, ordered by id then version.
    pub files: Vec<PatchFile>,
    /// Names that did not match the filename scheme.
    pub rejected: Vec<String>,
}

/// Parse `12.png` into `(12, 0)` and `12_3.png` into `(12, 3)`.
pub fn parse_patch_filename(name: &str) -> ResultEngine<PatchFile> {
    let invalid = || EngineError::InvalidFilename(name.to_string());

    let stem = name.split('.').next().unwrap_or_default();
    let mut parts = stem.split('_');
    let id_part = parts.next().ok_or_else(invalid)?;
    let version_part = parts.next();
    if parts.next().is_some() {
        return Err(invalid());
    }

    let base_id: i64 = id_part.parse().map_err(|_| invalid())?;
    if !(0..=PatchId::MAX_SEQ).contains(&base_id) {
        return Err(invalid());
    }
    let version = match version_part {
        Some(raw) => raw.parse::<i32>().map_err(|_| invalid())?,
        None => 0,
    };

    Ok(PatchFile { base_id, version })
}

/// List `dir` and parse every regular file in it.
pub fn scan_patch_dir(dir: &Path) -> ResultEngine<PatchScan> {
    let mut scan = PatchScan::default();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        match parse_patch_filename(&name) {
            Ok(file) => scan.files.push(file),
            Err(_) => scan.rejected.push(name),
        }
    }

    scan.files.sort();
    scan.rejected.sort();
    Ok(scan)
}
