//! The module contains `Patch`, its identifier and the `patches` table.
//!
//! Patches are stored under a single integer id space: real patches on even
//! ids, generated ones on odd ids. Inside the engine the id is carried as a
//! tagged [`PatchId`]; the packed integer only appears in the database, on
//! the wire and when deriving the image path on disk.

use std::{fmt, path::PathBuf};

use sea_orm::entity::{ActiveValue, prelude::*};
use crate::{EngineError, ResultEngine};

/// Which pool a patch belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatchKind {
    Real,
    Fake,
}

impl PatchKind {
    pub fn is_real(self) -> bool {
        matches!(self, Self::Real)
    }

    /// Directory (relative to the patch root) holding this kind of image.
    pub fn dir(self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Fake => "fake",
        }
    }
}

impl fmt::Display for PatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir())
    }
}

/// Tagged patch identifier: the pool plus the number found in the filename.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchId {
    pub kind: PatchKind,
    pub seq: i64,
}

impl PatchId {
    /// Largest `seq` whose packed id still fits in an `i64`.
    pub const MAX_SEQ: i64 = (i64::MAX - 1) / 2;

    pub fn real(seq: i64) -> Self {
        Self {
            kind: PatchKind::Real,
            seq,
        }
    }

    pub fn fake(seq: i64) -> Self {
        Self {
            kind: PatchKind::Fake,
            seq,
        }
    }

    /// Decode a packed id: even is real (`id / 2`), odd is fake (`(id - 1) / 2`).
    pub fn from_legacy(id: i64) -> ResultEngine<Self> {
        if id < 0 {
            return Err(EngineError::InvalidReference(format!("negative patch id {id}")));
        }
        if id % 2 == 0 {
            Ok(Self::real(id / 2))
        } else {
            Ok(Self::fake((id - 1) / 2))
        }
    }

    /// Packed id as stored in the `patches` table.
    ///
    /// `seq` stays within `0..=MAX_SEQ` for every id decoded by
    /// [`PatchId::from_legacy`] or built by the loader.
    pub fn legacy(self) -> i64 {
        match self.kind {
            PatchKind::Real => self.seq * 2,
            PatchKind::Fake => self.seq * 2 + 1,
        }
    }

    /// Image location relative to the patch root, e.g. `fake/12.png`.
    pub fn storage_path(self) -> PathBuf {
        PathBuf::from(self.kind.dir()).join(format!("{}.png", self.seq))
    }
}

impl fmt::Display for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.legacy())
    }
}

/// A single image shown to members.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patch {
    pub id: PatchId,
    /// Revision of the generator that produced the patch, 0 when unknown.
    pub version: i32,
}

impl Patch {
    pub fn new(id: PatchId, version: i32) -> Self {
        Self { id, version }
    }

    pub fn is_real(&self) -> bool {
        self.id.kind.is_real()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "patches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub real: bool,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Patch> for ActiveModel {
    fn from(patch: &Patch) -> Self {
        Self {
            id: ActiveValue::Set(patch.id.legacy()),
            real: ActiveValue::Set(patch.is_real()),
            version: ActiveValue::Set(patch.version),
        }
    }
}

impl TryFrom<Model> for Patch {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let id = PatchId::from_legacy(model.id)?;
        if id.kind.is_real() != model.real {
            return Err(EngineError::InvalidReference(format!(
                "patch {} stored with mismatched kind",
                model.id
            )));
        }
        Ok(Self {
            id,
            version: model.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_ids_split_by_parity() {
        assert_eq!(PatchId::from_legacy(10).unwrap(), PatchId::real(5));
        assert_eq!(PatchId::from_legacy(11).unwrap(), PatchId::fake(5));
        assert_eq!(PatchId::from_legacy(0).unwrap(), PatchId::real(0));
        assert_eq!(PatchId::from_legacy(1).unwrap(), PatchId::fake(0));
    }

    #[test]
    fn legacy_id_survives_decode() {
        for id in [0, 1, 2, 3, 42, 43, 1_000_001, i64::MAX - 1, i64::MAX] {
            assert_eq!(PatchId::from_legacy(id).unwrap().legacy(), id);
        }
    }

    #[test]
    fn decoded_seq_stays_within_packed_range() {
        assert_eq!(
            PatchId::from_legacy(i64::MAX).unwrap(),
            PatchId::fake(PatchId::MAX_SEQ)
        );
        assert_eq!(
            PatchId::from_legacy(i64::MAX - 1).unwrap(),
            PatchId::real(PatchId::MAX_SEQ)
        );
    }

    #[test]
    fn kind_is_named_after_its_directory() {
        assert_eq!(PatchKind::Real.to_string(), "real");
        assert_eq!(PatchKind::Fake.to_string(), "fake");
    }

    #[test]
    fn negative_legacy_id_is_rejected() {
        assert!(matches!(
            PatchId::from_legacy(-2),
            Err(EngineError::InvalidReference(_))
        ));
    }

    #[test]
    fn storage_path_follows_pool_layout() {
        assert_eq!(
            PatchId::from_legacy(10).unwrap().storage_path(),
            PathBuf::from("real").join("5.png")
        );
        assert_eq!(
            PatchId::from_legacy(7).unwrap().storage_path(),
            PathBuf::from("fake").join("3.png")
        );
    }

    #[test]
    fn model_with_wrong_kind_is_rejected() {
        let model = Model {
            id: 4,
            real: false,
            version: 0,
        };
        assert!(Patch::try_from(model).is_err());
    }
}
