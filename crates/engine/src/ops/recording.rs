use chrono::Utc;
use sea_orm::{ActiveValue, prelude::*};

use crate::{EngineError, Patch, PatchId, PatchKind, ResultEngine, classifications, patches};

use super::Engine;

/// A verdict as submitted by a member. Every field is required; they are
/// optional here so that an incomplete submission can be reported as
/// [`EngineError::MissingData`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Submission {
    pub real_patch_id: Option<i64>,
    pub fake_patch_id: Option<i64>,
    /// `true` when the member judged the real patch to be real.
    pub verdict: Option<bool>,
}

impl Engine {
    /// Append a verdict for `user_id`.
    ///
    /// No deduplication happens here: submitting the same pair twice stores
    /// two rows.
    pub async fn record_classification(
        &self,
        user_id: i32,
        submission: Submission,
    ) -> ResultEngine<()> {
        let (Some(real_patch_id), Some(fake_patch_id), Some(verdict)) = (
            submission.real_patch_id,
            submission.fake_patch_id,
            submission.verdict,
        ) else {
            return Err(EngineError::MissingData);
        };

        let real = self.require_patch(real_patch_id, PatchKind::Real).await?;
        let fake = self.require_patch(fake_patch_id, PatchKind::Fake).await?;

        let row = classifications::ActiveModel {
            id: ActiveValue::NotSet,
            real_patch_id: ActiveValue::Set(real.id.legacy()),
            fake_patch_id: ActiveValue::Set(fake.id.legacy()),
            user_id: ActiveValue::Set(user_id),
            timestamp: ActiveValue::Set(Utc::now()),
            classification: ActiveValue::Set(verdict),
        };
        row.insert(&self.database).await?;

        Ok(())
    }

    /// Look up a patch by its packed id.
    pub async fn patch(&self, id: i64) -> ResultEngine<Patch> {
        patches::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::InvalidReference(format!("patch {id} not found")))
            .and_then(Patch::try_from)
    }

    async fn require_patch(&self, id: i64, kind: PatchKind) -> ResultEngine<Patch> {
        let expected = PatchId::from_legacy(id)?;
        if expected.kind != kind {
            return Err(EngineError::InvalidReference(format!(
                "patch {id} is not a {kind} patch"
            )));
        }
        self.patch(id).await
    }
}
