use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::{path::PathBuf, sync::Arc};

use crate::{ServerError, classification, patch};
use engine::{Engine, EngineError};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    /// Root holding the `real/` and `fake/` image directories.
    pub patch_dir: Arc<PathBuf>,
}

impl ServerState {
    pub fn new(engine: Engine, patch_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine: Arc::new(engine),
            patch_dir: Arc::new(patch_dir.into()),
        }
    }
}

/// Resolve Basic credentials into the `engine::Member` handlers receive.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(credentials)) = auth_header else {
        return Err(ServerError::Unauthorized);
    };
    if credentials.username().is_empty() || credentials.password().is_empty() {
        return Err(ServerError::Unauthorized);
    }

    let member = match state
        .engine
        .authenticate(credentials.username(), credentials.password())
        .await
    {
        Ok(Some(member)) => member,
        Ok(None) => return Err(ServerError::Unauthorized),
        Err(EngineError::PasswordHash(err)) => {
            tracing::warn!(
                "stored password hash for {} is unreadable: {err}",
                credentials.username()
            );
            return Err(ServerError::Unauthorized);
        }
        Err(err) => return Err(err.into()),
    };

    request.extensions_mut().insert(member);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/classification",
            get(classification::get_pair).post(classification::post_classification),
        )
        .route("/patch", get(patch::get_patch))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}
