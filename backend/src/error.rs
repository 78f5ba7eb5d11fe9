use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::AuthError;
use crate::models::{InvalidTckn, LifecycleError};
use crate::solana::SolanaError;

/// Failures surfaced by a [`crate::store::Store`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    Duplicate(String),

    #[error("record not found")]
    NotFound,

    #[error("version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: i64, actual: i64 },

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("internal storage error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(what) => ApiError::Conflict(format!("{} already exists", what)),
            StoreError::NotFound => ApiError::NotFound("Record not found".to_string()),
            conflict @ StoreError::VersionConflict { .. } => ApiError::Conflict(conflict.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::NotOwner => ApiError::Forbidden(err.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<InvalidTckn> for ApiError {
    fn from(err: InvalidTckn) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<SolanaError> for ApiError {
    fn from(err: SolanaError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Token(_) => ApiError::Unauthorized("Invalid or expired token".to_string()),
            AuthError::Hash(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    error
                        .message
                        .as_ref()
                        .map_or_else(|| format!("{}: {}", field, error.code), ToString::to_string)
                })
            })
            .collect();
        if messages.is_empty() {
            // Nested structs only report through Display.
            messages.push(errors.to_string());
        }
        messages.sort();
        ApiError::BadRequest(messages.join("; "))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Internal details stay in the log.
        let message = match &self {
            ApiError::Internal(detail) => {
                log::error!("Request failed: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = json!({ "error": message, "code": self.code() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_client_statuses() {
        let dup: ApiError = StoreError::Duplicate("User".into()).into();
        assert_eq!(dup.status_code(), StatusCode::CONFLICT);

        let stale: ApiError = StoreError::VersionConflict { expected: 1, actual: 2 }.into();
        assert_eq!(stale.status_code(), StatusCode::CONFLICT);

        let missing: ApiError = StoreError::NotFound.into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let pool: ApiError = StoreError::Pool("timed out".into()).into();
        assert_eq!(pool.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn lifecycle_errors_distinguish_ownership() {
        let not_owner: ApiError = LifecycleError::NotOwner.into();
        assert_eq!(not_owner.status_code(), StatusCode::FORBIDDEN);

        let not_listed: ApiError = LifecycleError::NotOnSale.into();
        assert_eq!(not_listed.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let mut errors = ValidationErrors::new();
        let mut error = validator::ValidationError::new("length");
        error.message = Some("meskenId must be 1 to 64 characters".into());
        errors.add("mesken_id", error);
        errors.add("kapi_no", validator::ValidationError::new("length"));

        let api: ApiError = errors.into();
        assert_eq!(api.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            api.to_string(),
            "kapi_no: length; meskenId must be 1 to 64 characters"
        );
    }

    #[tokio::test]
    async fn internal_detail_is_not_sent_to_client() {
        let response =
            ApiError::Internal("postgres://user:pw@db refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["code"], "internal_error");
    }
}
