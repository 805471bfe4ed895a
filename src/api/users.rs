//! User (library member) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::{User, UserQuery},
};

use super::{books::PaginatedResponse, ApiJson};

/// List users with pagination
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(UserQuery),
    responses(
        (status = 200, description = "List of users", body = PaginatedResponse<User>)
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<PaginatedResponse<User>>> {
    let (from, size) = (query.from.unwrap_or(0), query.size.unwrap_or(10));
    let (items, total) = state.services.users.search_users(&query).await?;

    Ok(Json(PaginatedResponse { items, total, from, size }))
}

/// Search users by name substring and birthdate range
#[utoipa::path(
    get,
    path = "/users/search",
    tag = "users",
    params(UserQuery),
    responses(
        (status = 200, description = "Matching users", body = PaginatedResponse<User>),
        (status = 400, description = "Unparsable date bound", body = crate::error::ErrorResponse)
    )
)]
pub async fn search_users(
    State(state): State<crate::AppState>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<PaginatedResponse<User>>> {
    let (from, size) = (query.from.unwrap_or(0), query.size.unwrap_or(10));
    let (items, total) = state.services.users.search_users(&query).await?;

    Ok(Json(PaginatedResponse { items, total, from, size }))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<User>> {
    let user = state.services.users.get_by_id(id).await?;
    Ok(Json(user))
}

/// Get user by unique username
#[utoipa::path(
    get,
    path = "/users/username/{username}",
    tag = "users",
    params(
        ("username" = String, Path, description = "Username")
    ),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user_by_username(
    State(state): State<crate::AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<User>> {
    let user = state.services.users.get_by_username(&username).await?;
    Ok(Json(user))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = User,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input or rejected write", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    ApiJson(user): ApiJson<User>,
) -> AppResult<(StatusCode, Json<User>)> {
    let created = state.services.users.create_user(user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = User,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Id mismatch or invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    ApiJson(user): ApiJson<User>,
) -> AppResult<Json<User>> {
    let updated = state.services.users.update_user(id, user).await?;
    Ok(Json(updated))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ModifyBookListParams {
    /// "add" or "remove" (case-insensitive)
    pub action: Option<String>,
}

/// Adds or removes a book from the user's book list
#[utoipa::path(
    put,
    path = "/users/{userId}/books/{bookId}",
    tag = "users",
    params(
        ("userId" = i32, Path, description = "User ID"),
        ("bookId" = i32, Path, description = "Book ID"),
        ModifyBookListParams
    ),
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Unknown action or ownership conflict", body = crate::error::ErrorResponse),
        (status = 404, description = "User or book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn modify_book_list(
    State(state): State<crate::AppState>,
    Path((user_id, book_id)): Path<(i32, i32)>,
    Query(params): Query<ModifyBookListParams>,
) -> AppResult<Json<User>> {
    // A missing token flows through the same dispatch as an unknown one, so
    // the not-found checks still take precedence.
    let action = params.action.unwrap_or_default();
    let user = state
        .services
        .users
        .modify_book_list(user_id, book_id, &action)
        .await?;
    Ok(Json(user))
}
