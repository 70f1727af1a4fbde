use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// ApiError
///
/// The single error type returned by handlers and extractors. Each variant maps to
/// exactly one HTTP status, and every response body uses the same
/// `{"error": "..."}` shape the frontend expects.
///
/// The split between `Unauthenticated` (401, no valid identity) and `Forbidden`
/// (403, identity resolved but not allowed) is deliberate: the client redirects
/// to sign-in on the former and shows an access-denied view on the latter.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid session or token was presented.
    #[error("Authentication required")]
    Unauthenticated,

    /// The identity is valid but the role/scope check failed.
    #[error("Access denied")]
    Forbidden,

    /// Malformed or incomplete input. Carries a descriptive message.
    #[error("{0}")]
    Validation(String),

    /// A referenced entity id did not resolve. Carries the entity kind.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// An optimistic-concurrency check lost against a concurrent write.
    #[error("{0}")]
    Conflict(String),

    /// The external data layer failed. Never retried here; logged and surfaced
    /// as a generic 500 so internals do not leak to clients.
    #[error("Internal server error")]
    Persistence(#[from] sqlx::Error),

    /// Any other internal failure (e.g. password hashing).
    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Persistence(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Operator diagnosis happens through the log; the client only ever sees
        // the generic message for 500-class failures.
        match &self {
            ApiError::Persistence(e) => tracing::error!("persistence error: {:?}", e),
            ApiError::Internal(msg) => tracing::error!("internal error: {}", msg),
            _ => {}
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
