//! Initial schema.
//!
//! - `members`: accounts allowed to classify
//! - `patches`: image records, real on even ids and fake on odd ids
//! - `classifications`: append-only verdict log

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Members {
    Table,
    Id,
    Username,
    Password,
}

#[derive(Iden)]
enum Patches {
    Table,
    Id,
    Real,
}

#[derive(Iden)]
enum Classifications {
    Table,
    Id,
    RealPatchId,
    FakePatchId,
    UserId,
    Timestamp,
    Classification,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Members::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Members::Username)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Members::Password).string().not_null())
                    .to_owned(),
            )
            .await?;

        // Ids are assigned by the bulk loader, never by the database.
        manager
            .create_table(
                Table::create()
                    .table(Patches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Patches::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Patches::Real).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Classifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Classifications::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Classifications::RealPatchId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Classifications::FakePatchId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Classifications::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(Classifications::Timestamp)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Classifications::Classification)
                            .boolean()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-classifications-real_patch_id")
                            .from(Classifications::Table, Classifications::RealPatchId)
                            .to(Patches::Table, Patches::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-classifications-fake_patch_id")
                            .from(Classifications::Table, Classifications::FakePatchId)
                            .to(Patches::Table, Patches::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-classifications-user_id")
                            .from(Classifications::Table, Classifications::UserId)
                            .to(Members::Table, Members::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-classifications-user_id-timestamp")
                    .table(Classifications::Table)
                    .col(Classifications::UserId)
                    .col(Classifications::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Classifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Patches::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await?;
        Ok(())
    }
}
