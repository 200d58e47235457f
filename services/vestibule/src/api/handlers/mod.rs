use crate::flow::FlowError;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

pub mod authentication;
pub mod health;
pub mod registration;

/// Structured error body; the only error shape handlers emit.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Stable machine-readable kind.
    pub error: String,
    pub message: String,
}

fn error_kind(err: &FlowError) -> (StatusCode, &'static str) {
    match err {
        FlowError::UnknownIdentityComponent(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "unknown_identity_component")
        }
        FlowError::InvalidAuthenticationState => {
            (StatusCode::BAD_REQUEST, "invalid_authentication_state")
        }
        FlowError::InvalidRegistrationState => {
            (StatusCode::BAD_REQUEST, "invalid_registration_state")
        }
        FlowError::AuthenticationSubmitPrompt => {
            (StatusCode::FORBIDDEN, "authentication_submit_prompt")
        }
        FlowError::RegistrationSubmitPrompt => {
            (StatusCode::FORBIDDEN, "registration_submit_prompt")
        }
        FlowError::ExpiredState => (StatusCode::UNAUTHORIZED, "expired_state"),
        FlowError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
        FlowError::DocumentAtomicCommit => (StatusCode::CONFLICT, "document_atomic_commit"),
        FlowError::Store(crate::store::StoreError::NotFound) => {
            (StatusCode::NOT_FOUND, "not_found")
        }
        FlowError::Store(_) | FlowError::Encoding(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal")
        }
        FlowError::Token(_) => (StatusCode::UNAUTHORIZED, "invalid_token"),
    }
}

impl IntoResponse for FlowError {
    fn into_response(self) -> Response {
        let (status, kind) = error_kind(&self);
        if status.is_server_error() {
            error!("{}", self);
        }
        let body = ErrorBody {
            error: kind.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Bearer token from the `Authorization` header, trimmed, empty rejected.
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
