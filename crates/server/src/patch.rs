use api_types::patch::PatchQuery;
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use engine::EngineError;

use crate::{ServerError, server::ServerState};

/// Serve the PNG behind a legacy patch ID.
pub async fn get_patch(
    State(state): State<ServerState>,
    Query(query): Query<PatchQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let id: i64 = query
        .id
        .as_deref()
        .map(str::trim)
        .and_then(|raw| raw.parse().ok())
        .ok_or(EngineError::MissingData)?;

    let patch = state.engine.patch(id).await?;
    let path = state.patch_dir.join(patch.id.storage_path());
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(ServerError::Storage)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}
