//! The module contains the `classifications` table: one row per verdict.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A stored verdict as reported by the admin tooling.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassificationRecord {
    pub id: i32,
    /// `true` when the member picked the real patch as real.
    pub classification: bool,
    pub timestamp: DateTime<Utc>,
    pub real_patch_id: i64,
    pub fake_patch_id: i64,
    pub fake_patch_version: i32,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "classifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub real_patch_id: i64,
    pub fake_patch_id: i64,
    pub user_id: i32,
    pub timestamp: DateTimeUtc,
    pub classification: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::patches::Entity",
        from = "Column::RealPatchId",
        to = "super::patches::Column::Id"
    )]
    RealPatch,
    #[sea_orm(
        belongs_to = "super::patches::Entity",
        from = "Column::FakePatchId",
        to = "super::patches::Column::Id"
    )]
    FakePatch,
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::UserId",
        to = "super::members::Column::Id"
    )]
    Member,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
