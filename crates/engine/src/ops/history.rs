use std::collections::BTreeMap;

use sea_orm::{FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect, prelude::*};
use serde::Serialize;

use crate::{
    ClassificationRecord, EngineError, Judgment, ResultEngine, StatsReport, classifications,
    patches,
};

use super::Engine;

/// Statistics for one member.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MemberReport {
    pub username: String,
    /// Left out of the cohort figures.
    pub excluded: bool,
    pub report: StatsReport,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatisticsSummary {
    pub excluded_users: Vec<String>,
    /// Every member not listed in `excluded_users`, pooled.
    pub cohort: StatsReport,
    pub members: Vec<MemberReport>,
}

#[derive(Debug, FromQueryResult)]
struct JudgmentRow {
    id: i32,
    user_id: i32,
    real_patch_id: i64,
    fake_patch_id: i64,
    timestamp: DateTimeUtc,
    classification: bool,
    version: i32,
}

impl From<&JudgmentRow> for Judgment {
    fn from(row: &JudgmentRow) -> Self {
        Self {
            timestamp: row.timestamp,
            correct: row.classification,
            version: row.version,
        }
    }
}

impl From<JudgmentRow> for ClassificationRecord {
    fn from(row: JudgmentRow) -> Self {
        Self {
            id: row.id,
            classification: row.classification,
            timestamp: row.timestamp,
            real_patch_id: row.real_patch_id,
            fake_patch_id: row.fake_patch_id,
            fake_patch_version: row.version,
        }
    }
}

impl Engine {
    /// Verdicts of `username`, oldest first.
    pub async fn classifications_for(
        &self,
        username: &str,
    ) -> ResultEngine<Vec<ClassificationRecord>> {
        let member = self.member(username).await?;
        let rows = self.judgment_rows(Some(member.id)).await?;
        Ok(rows.into_iter().map(ClassificationRecord::from).collect())
    }

    /// Delete every verdict of `username`. Returns how many rows went away.
    pub async fn clear_classifications(&self, username: &str) -> ResultEngine<u64> {
        let member = self.member(username).await?;
        let res = classifications::Entity::delete_many()
            .filter(classifications::Column::UserId.eq(member.id))
            .exec(&self.database)
            .await?;
        Ok(res.rows_affected)
    }

    /// Chronological history of `user_id` as fed to the statistics.
    pub async fn judgment_history(&self, user_id: i32) -> ResultEngine<Vec<Judgment>> {
        let rows = self.judgment_rows(Some(user_id)).await?;
        Ok(rows.iter().map(Judgment::from).collect())
    }

    pub async fn member_statistics(&self, username: &str) -> ResultEngine<StatsReport> {
        let member = self.member(username).await?;
        let history = self.judgment_history(member.id).await?;
        Ok(StatsReport::for_history(&history))
    }

    /// Reports for every member plus the pooled cohort of members not named
    /// in `excluded`.
    pub async fn statistics(&self, excluded: &[String]) -> ResultEngine<StatisticsSummary> {
        let members = self.members().await?;

        let mut histories: BTreeMap<i32, Vec<Judgment>> = BTreeMap::new();
        for row in self.judgment_rows(None).await? {
            histories
                .entry(row.user_id)
                .or_default()
                .push(Judgment::from(&row));
        }

        let mut cohort: Vec<&[Judgment]> = Vec::new();
        let mut reports = Vec::with_capacity(members.len());
        for member in members {
            let history = histories
                .get(&member.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let is_excluded = excluded.iter().any(|name| name == &member.username);
            if !is_excluded {
                cohort.push(history);
            }
            reports.push(MemberReport {
                username: member.username,
                excluded: is_excluded,
                report: StatsReport::for_history(history),
            });
        }

        Ok(StatisticsSummary {
            excluded_users: excluded.to_vec(),
            cohort: StatsReport::for_cohort(&cohort),
            members: reports,
        })
    }

    async fn judgment_rows(&self, user_id: Option<i32>) -> ResultEngine<Vec<JudgmentRow>> {
        let mut query = classifications::Entity::find()
            .select_only()
            .columns([
                classifications::Column::Id,
                classifications::Column::UserId,
                classifications::Column::RealPatchId,
                classifications::Column::FakePatchId,
                classifications::Column::Timestamp,
                classifications::Column::Classification,
            ])
            .column_as(patches::Column::Version, "version")
            .join(
                JoinType::InnerJoin,
                classifications::Relation::FakePatch.def(),
            );
        if let Some(user_id) = user_id {
            query = query.filter(classifications::Column::UserId.eq(user_id));
        }

        query
            .order_by_asc(classifications::Column::UserId)
            .order_by_asc(classifications::Column::Timestamp)
            .order_by_asc(classifications::Column::Id)
            .into_model::<JudgmentRow>()
            .all(&self.database)
            .await
            .map_err(EngineError::from)
    }
}
