//! Book (catalog) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{Book, BookQuery, BookSearchQuery},
    services::books::IsbnLookup,
};

use super::ApiJson;

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Records of the requested page
    pub items: Vec<T>,
    /// Total number of matching records
    pub total: i64,
    /// Zero-based page index
    pub from: i64,
    /// Page size
    pub size: i64,
}

/// List books with optional filters and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "List of books", body = PaginatedResponse<Book>)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    let (from, size) = (query.from.unwrap_or(0), query.size.unwrap_or(10));
    let (items, total) = state.services.books.search_books(&query).await?;

    Ok(Json(PaginatedResponse { items, total, from, size }))
}

/// Search books by publisher, year and genre
#[utoipa::path(
    get,
    path = "/books/search",
    tag = "books",
    params(BookSearchQuery),
    responses(
        (status = 200, description = "Matching books", body = PaginatedResponse<Book>)
    )
)]
pub async fn search_books(
    State(state): State<crate::AppState>,
    Query(query): Query<BookSearchQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    let query: BookQuery = query.into();
    let (from, size) = (query.from.unwrap_or(0), query.size.unwrap_or(10));
    let (items, total) = state.services.books.search_books(&query).await?;

    Ok(Json(PaginatedResponse { items, total, from, size }))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get_by_id(id).await?;
    Ok(Json(book))
}

/// Get book by ISBN, backfilling from the metadata source on a local miss.
/// Answers 200 for a local hit and 201 when a record was backfilled.
#[utoipa::path(
    get,
    path = "/books/isbn/{isbn}",
    tag = "books",
    params(
        ("isbn" = String, Path, description = "Book ISBN")
    ),
    responses(
        (status = 200, description = "Book found locally", body = Book),
        (status = 201, description = "Book backfilled from the metadata source", body = Book),
        (status = 404, description = "Unknown ISBN", body = crate::error::ErrorResponse),
        (status = 502, description = "Metadata source unreachable", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book_by_isbn(
    State(state): State<crate::AppState>,
    Path(isbn): Path<String>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let (book, outcome) = state.services.books.get_by_isbn(&isbn).await?;
    let status = match outcome {
        IsbnLookup::Local => StatusCode::OK,
        IsbnLookup::Backfilled => StatusCode::CREATED,
    };
    Ok((status, Json(book)))
}

/// First book by an author
#[utoipa::path(
    get,
    path = "/books/author/{author}",
    tag = "books",
    params(
        ("author" = String, Path, description = "Author name")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "No book by this author", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book_by_author(
    State(state): State<crate::AppState>,
    Path(author): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get_top_by_author(&author).await?;
    Ok(Json(book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = Book,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    ApiJson(book): ApiJson<Book>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let created = state.services.books.create_book(book).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = Book,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Id mismatch or invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    ApiJson(book): ApiJson<Book>,
) -> AppResult<Json<Book>> {
    let updated = state.services.books.update_book(id, book).await?;
    Ok(Json(updated))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.books.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
