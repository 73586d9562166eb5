use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde_json::json;
use thiserror::Error;

/// Failure taxonomy for the ticket subsystem. Every handler surfaces exactly
/// one of these kinds; a caller never observes a partially applied write.
#[derive(Debug, Error)]
pub enum TicketError {
    #[error("{0}")]
    Validation(String),

    #[error("referenced {field} does not exist")]
    ReferenceNotFound { field: &'static str },

    #[error("ticket {0} not found")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for TicketError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            TicketError::Validation(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            TicketError::ReferenceNotFound { field } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": self.to_string(), "field": field }),
            ),
            TicketError::NotFound(_) => {
                (StatusCode::NOT_FOUND, json!({ "error": self.to_string() }))
            }
            TicketError::Storage(_) | TicketError::Pool(_) | TicketError::Task(_) => {
                error!("{self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal storage error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
