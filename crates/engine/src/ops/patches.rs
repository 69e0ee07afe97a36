use sea_orm::{
    ConnectionTrait, PaginatorTrait, QueryFilter, Statement, TransactionTrait, prelude::*,
};
use serde::Serialize;

use crate::{EngineError, PatchFile, PatchKind, ResultEngine, patches};

use super::{Engine, with_tx};

/// Outcome of a bulk load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub inserted: u64,
    /// Files whose id was already present.
    pub skipped: u64,
}

impl Engine {
    /// Insert the scanned patches of both pools, skipping ids that already
    /// exist. With `force` the pool is wiped first, and with it every
    /// classification that references it. Nothing is written when any file
    /// lies outside the packed id range.
    pub async fn load_patches(
        &self,
        real: &[PatchFile],
        fake: &[PatchFile],
        force: bool,
    ) -> ResultEngine<LoadSummary> {
        let files = real
            .iter()
            .map(|file| file.into_patch(PatchKind::Real))
            .chain(fake.iter().map(|file| file.into_patch(PatchKind::Fake)))
            .collect::<ResultEngine<Vec<_>>>()?;

        with_tx!(self, |db_tx| {
            if force {
                let backend = self.database.get_database_backend();
                db_tx
                    .execute(Statement::from_string(backend, "DELETE FROM classifications;"))
                    .await?;
                db_tx
                    .execute(Statement::from_string(backend, "DELETE FROM patches;"))
                    .await?;
            }

            let mut summary = LoadSummary::default();
            for patch in &files {
                let exists = patches::Entity::find_by_id(patch.id.legacy())
                    .one(&db_tx)
                    .await?
                    .is_some();
                if exists {
                    summary.skipped += 1;
                    continue;
                }
                patches::ActiveModel::from(patch).insert(&db_tx).await?;
                summary.inserted += 1;
            }

            Ok::<LoadSummary, EngineError>(summary)
        })
    }

    /// Number of stored patches of `kind`.
    pub async fn patch_count(&self, kind: PatchKind) -> ResultEngine<u64> {
        Ok(patches::Entity::find()
            .filter(patches::Column::Real.eq(kind.is_real()))
            .count(&self.database)
            .await?)
    }

    /// Delete every classification, patch and member.
    pub async fn reset(&self) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let backend = self.database.get_database_backend();
            for table in ["classifications", "patches", "members"] {
                db_tx
                    .execute(Statement::from_string(backend, format!("DELETE FROM {table};")))
                    .await?;
            }
            Ok::<(), EngineError>(())
        })
    }
}
