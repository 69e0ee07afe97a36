use sea_orm::{
    ConnectionTrait, Order, QueryFilter, QueryOrder, Statement,
    prelude::*,
    sea_query::{Expr, Query},
};

use crate::{Patch, PatchKind, ResultEngine, classifications, patches};

use super::{Engine, SelectionStrategy};

/// Next pair to show a member.
///
/// Both sides are `None` once the member has seen every patch of either
/// pool in its role; callers treat that as "no more pairs".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairSelection {
    pub real: Option<Patch>,
    pub fake: Option<Patch>,
    /// Distinct (real, fake) pairs the member has judged so far.
    pub classification_count: u64,
}

impl PairSelection {
    pub fn pair(&self) -> Option<(&Patch, &Patch)> {
        self.real.as_ref().zip(self.fake.as_ref())
    }

    pub fn is_exhausted(&self) -> bool {
        self.pair().is_none()
    }
}

impl Engine {
    /// Pick the next real and fake patch `user_id` has not been shown in
    /// that role.
    pub async fn select_pair(&self, user_id: i32) -> ResultEngine<PairSelection> {
        let real = self.next_unseen(user_id, PatchKind::Real).await?;
        let fake = self.next_unseen(user_id, PatchKind::Fake).await?;
        let classification_count = self.classification_count(user_id).await?;

        let (real, fake) = match (real, fake) {
            (Some(real), Some(fake)) => (Some(real), Some(fake)),
            _ => (None, None),
        };

        Ok(PairSelection {
            real,
            fake,
            classification_count,
        })
    }

    /// Number of distinct (real, fake) pairs judged by `user_id`.
    pub async fn classification_count(&self, user_id: i32) -> ResultEngine<u64> {
        let backend = self.database.get_database_backend();
        let row = self
            .database
            .query_one(Statement::from_sql_and_values(
                backend,
                "SELECT COUNT(*) AS total FROM (SELECT DISTINCT real_patch_id, fake_patch_id FROM classifications WHERE user_id = ?);",
                vec![user_id.into()],
            ))
            .await?;

        let total: i64 = match row {
            Some(row) => row.try_get("", "total")?,
            None => 0,
        };
        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn next_unseen(&self, user_id: i32, kind: PatchKind) -> ResultEngine<Option<Patch>> {
        let role = match kind {
            PatchKind::Real => classifications::Column::RealPatchId,
            PatchKind::Fake => classifications::Column::FakePatchId,
        };
        let seen = Query::select()
            .column(role)
            .from(classifications::Entity)
            .and_where(classifications::Column::UserId.eq(user_id))
            .to_owned();

        let query = patches::Entity::find()
            .filter(patches::Column::Real.eq(kind.is_real()))
            .filter(patches::Column::Id.not_in_subquery(seen));
        let query = match self.strategy {
            SelectionStrategy::LowestId => query.order_by_asc(patches::Column::Id),
            SelectionStrategy::Random => query.order_by(Expr::cust("RANDOM()"), Order::Asc),
        };

        query
            .one(&self.database)
            .await?
            .map(Patch::try_from)
            .transpose()
    }
}
