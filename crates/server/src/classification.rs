//! Pair selection and verdict endpoints

use api_types::classification::{ClassificationNew, PairView, Submitted};
use axum::{Extension, Form, Json, extract::State};
use engine::{EngineError, Member, Submission};

use crate::{ServerError, server::ServerState};

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_patch_id(raw: &str) -> Result<i64, EngineError> {
    raw.parse()
        .map_err(|_| EngineError::InvalidReference(format!("malformed patch id {raw:?}")))
}

/// Next pair for the current member, in random display order.
pub async fn get_pair(
    Extension(member): Extension<Member>,
    State(state): State<ServerState>,
) -> Result<Json<PairView>, ServerError> {
    let selection = state.engine.select_pair(member.id).await?;

    let Some((real, fake)) = selection.pair() else {
        tracing::debug!("{} has no unseen pair left", member.username);
        return Ok(Json(PairView {
            real_patch_id: None,
            fake_patch_id: None,
            patch1: None,
            patch2: None,
            classification_count: selection.classification_count,
        }));
    };

    let (real_id, fake_id) = (real.id.legacy(), fake.id.legacy());
    let (patch1, patch2) = if rand::random::<bool>() {
        (real_id, fake_id)
    } else {
        (fake_id, real_id)
    };

    Ok(Json(PairView {
        real_patch_id: Some(real_id),
        fake_patch_id: Some(fake_id),
        patch1: Some(patch1),
        patch2: Some(patch2),
        classification_count: selection.classification_count,
    }))
}

/// Store the current member's verdict on a pair.
pub async fn post_classification(
    Extension(member): Extension<Member>,
    State(state): State<ServerState>,
    Form(payload): Form<ClassificationNew>,
) -> Result<Json<Submitted>, ServerError> {
    let (Some(real), Some(fake), Some(verdict)) = (
        non_empty(&payload.real_patch_id),
        non_empty(&payload.fake_patch_id),
        non_empty(&payload.classification),
    ) else {
        return Err(EngineError::MissingData.into());
    };

    let submission = Submission {
        real_patch_id: Some(parse_patch_id(real)?),
        fake_patch_id: Some(parse_patch_id(fake)?),
        verdict: Some(verdict == "real"),
    };
    state
        .engine
        .record_classification(member.id, submission)
        .await?;

    tracing::info!(
        "{} judged real={} fake={} as {verdict}",
        member.username,
        real,
        fake
    );
    Ok(Json(Submitted::ok()))
}
