//! Error types for Lectoria server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Resource kinds exposed by the API, used to tag error origins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Book,
    User,
}

impl Resource {
    /// Boundary origin tag for this resource
    pub fn origin(&self) -> &'static str {
        match self {
            Resource::Book => "/books",
            Resource::User => "/users",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Book => write!(f, "book"),
            Resource::User => write!(f, "user"),
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("requested {resource} {key} has not been found")]
    NotFound { resource: Resource, key: String },

    #[error("provided path id and body id do not match")]
    IdMismatch { resource: Resource },

    #[error("user {user_id} already owns book {book_id}")]
    BookAlreadyOwned { user_id: i32, book_id: i32 },

    #[error("the specified action '{action}' has not been found")]
    UnrecognizedAction { action: String },

    #[error("{field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("an error occurred while trying to save data")]
    PersistenceIntegrity { resource: Resource },

    #[error("metadata service failure: {0}")]
    ExternalService(String),

    #[error("internal server error: {0}")]
    Internal(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn book_not_found(key: impl ToString) -> Self {
        AppError::NotFound {
            resource: Resource::Book,
            key: key.to_string(),
        }
    }

    pub fn user_not_found(key: impl ToString) -> Self {
        AppError::NotFound {
            resource: Resource::User,
            key: key.to_string(),
        }
    }
}

/// Maps the first field failure of a `validator` run into the domain error,
/// so every precondition violation names the offending field.
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, error) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| (field.to_string(), errs.first().cloned()))
            .unwrap_or_else(|| ("unknown".to_string(), None));

        let reason = error
            .and_then(|e| e.message.map(|m| m.to_string()))
            .unwrap_or_else(|| "invalid value".to_string());

        AppError::Validation { field, reason }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Resource the error pertains to, when attributable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<&'static str>,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        let (status, origin) = match &self {
            AppError::NotFound { resource, .. } => (StatusCode::NOT_FOUND, Some(resource.origin())),
            AppError::IdMismatch { resource } => (StatusCode::BAD_REQUEST, Some(resource.origin())),
            AppError::BookAlreadyOwned { .. } => {
                (StatusCode::BAD_REQUEST, Some(Resource::User.origin()))
            }
            AppError::UnrecognizedAction { .. } => {
                (StatusCode::BAD_REQUEST, Some(Resource::User.origin()))
            }
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, None),
            AppError::PersistenceIntegrity { resource } => {
                (StatusCode::BAD_REQUEST, Some(resource.origin()))
            }
            AppError::ExternalService(msg) => {
                tracing::warn!("Metadata service failure: {}", msg);
                (StatusCode::BAD_GATEWAY, Some(Resource::Book.origin()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        origin: None,
                        error: "internal server error".to_string(),
                        timestamp: Utc::now(),
                    }),
                )
                    .into_response();
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        origin: None,
                        error: "database error".to_string(),
                        timestamp: Utc::now(),
                    }),
                )
                    .into_response();
            }
        };

        let body = Json(ErrorResponse {
            origin,
            error: message,
            timestamp: Utc::now(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(status_of(AppError::book_not_found(7)), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::user_not_found(7)), StatusCode::NOT_FOUND);
    }

    #[test]
    fn domain_failures_map_to_400() {
        assert_eq!(
            status_of(AppError::IdMismatch { resource: Resource::Book }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::BookAlreadyOwned { user_id: 1, book_id: 2 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::UnrecognizedAction { action: "swap".to_string() }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::PersistenceIntegrity { resource: Resource::User }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Validation {
                field: "pages".to_string(),
                reason: "book pages must be positive".to_string(),
            }),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn external_service_maps_to_502() {
        assert_eq!(
            status_of(AppError::ExternalService("timed out".to_string())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn messages_carry_identifiers() {
        let err = AppError::BookAlreadyOwned { user_id: 3, book_id: 9 };
        assert_eq!(err.to_string(), "user 3 already owns book 9");

        let err = AppError::book_not_found("978-0140328721");
        assert_eq!(
            err.to_string(),
            "requested book 978-0140328721 has not been found"
        );
    }

    #[test]
    fn validation_errors_name_the_field() {
        use validator::Validate;

        #[derive(Validate)]
        struct Probe {
            #[validate(length(min = 1, message = "book title can't be empty"))]
            title: String,
        }

        let probe = Probe { title: String::new() };
        let err = AppError::from(probe.validate().unwrap_err());
        match err {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "title");
                assert_eq!(reason, "book title can't be empty");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
