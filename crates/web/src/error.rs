use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use importer::ImporterError;
use serde_json::json;
use std::fmt;
use storage::error::StorageError;
use validator::ValidationErrors;

use crate::features::leaderboard::render::RenderedPage;

pub const NOT_OWNER_NOTICE: &str = "Only the author of the command can perform this action.";

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    Validation(ValidationErrors),
    BadRequest(String),
    Unauthorized,
    /// Shown only to the actor that was turned away.
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    /// The session timed out; carries the page it was left on.
    Gone(Box<RenderedPage>),
    Upstream(ImporterError),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::Conflict(msg) => write!(f, "Conflict: {}", msg),
            Self::Gone(_) => write!(f, "Session expired"),
            Self::Upstream(e) => write!(f, "Upstream error: {}", e),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status_code = match &self {
            Self::Storage(StorageError::NotFound | StorageError::UnknownIdentity(_)) => {
                StatusCode::NOT_FOUND
            }
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Gone(_) => StatusCode::GONE,
            Self::Upstream(ImporterError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Upstream(e) if e.is_transient() => StatusCode::BAD_GATEWAY,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            Self::Storage(StorageError::NotFound) => {
                json!({
                    "error": "Resource not found"
                })
            }
            Self::Storage(e @ StorageError::UnknownIdentity(_)) => {
                json!({
                    "error": e.to_string()
                })
            }
            Self::Storage(e) => {
                tracing::error!("Storage error: {:?}", e);
                json!({
                    "error": "An internal error occurred"
                })
            }
            Self::Validation(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| {
                            format!(
                                "{}: {}",
                                field,
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            )
                        })
                    })
                    .collect();

                json!({
                    "error": "Validation failed",
                    "details": field_errors
                })
            }
            Self::BadRequest(msg) | Self::Forbidden(msg) | Self::NotFound(msg) | Self::Conflict(msg) => {
                json!({
                    "error": msg
                })
            }
            Self::Unauthorized => {
                json!({
                    "error": "Unauthorized"
                })
            }
            Self::Gone(page) => {
                json!({
                    "error": "Session expired",
                    "page": page
                })
            }
            Self::Upstream(ImporterError::NotFound(username)) => {
                json!({
                    "error": format!("Could not find Chess.com user '{}'", username)
                })
            }
            Self::Upstream(e) if e.is_transient() => {
                tracing::warn!("Upstream error: {}", e);
                json!({
                    "error": "Could not reach Chess.com, try again later"
                })
            }
            Self::Upstream(e) => {
                tracing::error!("Upstream error: {}", e);
                json!({
                    "error": "An internal error occurred"
                })
            }
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}

impl From<ImporterError> for WebError {
    fn from(error: ImporterError) -> Self {
        match error {
            ImporterError::StorageError(e) => Self::Storage(e),
            ImporterError::SweepInProgress => {
                Self::Conflict("A rating sweep is already running".to_string())
            }
            other => Self::Upstream(other),
        }
    }
}

pub type ApiResult<T> = Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;
    use storage::models::IdentityId;

    fn status_of(error: impl Into<WebError>) -> StatusCode {
        let error: WebError = error.into();
        error.into_response().status()
    }

    #[test]
    fn test_importer_errors_map_to_status_codes() {
        assert_eq!(
            status_of(ImporterError::NotFound("ghost".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ImporterError::Transient("timeout".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(ImporterError::RetriesExhausted {
                username: "bob".into(),
                attempts: 5
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(ImporterError::MembershipError("role missing".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ImporterError::SweepInProgress),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ImporterError::StorageError(StorageError::UnknownIdentity(IdentityId(4)))),
            StatusCode::NOT_FOUND
        );
    }
}
