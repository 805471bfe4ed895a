//! API handlers for Lectoria REST endpoints

pub mod books;
pub mod health;
pub mod openapi;
pub mod users;

use axum::extract::rejection::JsonRejection;

use crate::error::AppError;

/// Json extractor that routes malformed bodies through the domain error
/// translator, so the boundary answers a structured 400 instead of the
/// framework default.
#[derive(axum::extract::FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation {
            field: "body".to_string(),
            reason: rejection.body_text(),
        }
    }
}
