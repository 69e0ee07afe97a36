use std::io::ErrorKind;

use api_types::classification::Submitted;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use server::{ServerState, router, run_with_listener};

mod classification;
mod patch;
mod server;

pub enum ServerError {
    Engine(EngineError),
    Unauthorized,
    /// The patch exists but its image could not be read.
    Storage(std::io::Error),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::MissingData | EngineError::InvalidFilename(_) => StatusCode::BAD_REQUEST,
        EngineError::InvalidReference(_) | EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::PasswordHash(_) => StatusCode::UNAUTHORIZED,
        EngineError::Io(_) | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::MissingData => "Missing data".to_string(),
        EngineError::InvalidReference(detail) => {
            tracing::debug!("rejected patch reference: {detail}");
            "Invalid patch IDs".to_string()
        }
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Io(io_err) => {
            tracing::error!("io error: {io_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, "Not authenticated".to_string()),
            ServerError::Storage(err) if err.kind() == ErrorKind::NotFound => {
                tracing::warn!("patch image missing: {err}");
                (StatusCode::NOT_FOUND, "Patch image not found".to_string())
            }
            ServerError::Storage(err) => {
                tracing::error!("failed to read patch image: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(Submitted::failed(message))).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
