//! Book (catalog entry) model and query types.
//!
//! The book carries the fields the membership front end works with; `id` is
//! assigned by the store on creation (0 marks a not-yet-persisted record).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Full book model (DB + API)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Validate, ToSchema)]
pub struct Book {
    #[serde(default)]
    pub id: i32,
    /// Only optional attribute of a book
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[validate(length(min = 1, message = "book author can't be empty"))]
    pub author: String,
    /// Cover URL
    #[validate(length(min = 1, message = "book image url can't be empty"))]
    pub image: String,
    #[validate(length(min = 1, message = "book title can't be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "book subtitle can't be empty"))]
    pub subtitle: String,
    #[validate(length(min = 1, message = "book publisher can't be empty"))]
    pub publisher: String,
    /// Publication year, kept as text (upstream dates are free-form)
    #[validate(length(min = 1, message = "book year can't be empty"))]
    pub year: String,
    #[validate(range(min = 1, message = "book pages must be positive"))]
    pub pages: i32,
    #[validate(length(min = 1, message = "book isbn can't be empty"))]
    pub isbn: String,
}

impl Book {
    /// Checks every field invariant, naming the offending field on failure
    pub fn ensure_valid(&self) -> AppResult<()> {
        validator::Validate::validate(self).map_err(AppError::from)?;
        Ok(())
    }
}

/// Book list/search query parameters. Every criterion is optional; an absent
/// or empty one does not filter. `pages` treats non-positive values as absent.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    pub genre: Option<String>,
    pub author: Option<String>,
    pub image: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<String>,
    pub pages: Option<i32>,
    pub isbn: Option<String>,
    /// Zero-based page index
    pub from: Option<i64>,
    /// Page size
    pub size: Option<i64>,
    /// Sort key (whitelisted; defaults to id)
    pub sort: Option<String>,
}

/// Narrow search surface: publisher/year/genre only
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookSearchQuery {
    pub publisher: Option<String>,
    pub year: Option<String>,
    pub genre: Option<String>,
    pub from: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<String>,
}

impl From<BookSearchQuery> for BookQuery {
    fn from(q: BookSearchQuery) -> Self {
        BookQuery {
            publisher: q.publisher,
            year: q.year,
            genre: q.genre,
            from: q.from,
            size: q.size,
            sort: q.sort,
            ..BookQuery::default()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_book(id: i32) -> Book {
        Book {
            id,
            genre: Some("Fantasy".to_string()),
            author: "Terry Pratchett".to_string(),
            image: "https://covers.example.org/158.jpg".to_string(),
            title: "Mort".to_string(),
            subtitle: "A Discworld Novel".to_string(),
            publisher: "Gollancz".to_string(),
            year: "1987".to_string(),
            pages: 272,
            isbn: "978-0552131063".to_string(),
        }
    }

    #[test]
    fn valid_book_passes() {
        assert!(sample_book(0).ensure_valid().is_ok());
    }

    #[test]
    fn missing_genre_is_allowed() {
        let mut book = sample_book(0);
        book.genre = None;
        assert!(book.ensure_valid().is_ok());
    }

    #[test]
    fn empty_required_fields_are_rejected() {
        for field in ["author", "image", "title", "subtitle", "publisher", "year", "isbn"] {
            let mut book = sample_book(0);
            match field {
                "author" => book.author.clear(),
                "image" => book.image.clear(),
                "title" => book.title.clear(),
                "subtitle" => book.subtitle.clear(),
                "publisher" => book.publisher.clear(),
                "year" => book.year.clear(),
                "isbn" => book.isbn.clear(),
                _ => unreachable!(),
            }
            match book.ensure_valid() {
                Err(AppError::Validation { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected validation failure for {}, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn non_positive_pages_are_rejected() {
        for pages in [0, -10] {
            let mut book = sample_book(0);
            book.pages = pages;
            match book.ensure_valid() {
                Err(AppError::Validation { field, .. }) => assert_eq!(field, "pages"),
                other => panic!("expected validation failure, got {:?}", other),
            }
        }
    }

    #[test]
    fn id_defaults_to_zero_when_absent_from_payload() {
        let book: Book = serde_json::from_value(serde_json::json!({
            "author": "A",
            "image": "http://img",
            "title": "T",
            "subtitle": "S",
            "publisher": "P",
            "year": "2000",
            "pages": 10,
            "isbn": "X"
        }))
        .unwrap();
        assert_eq!(book.id, 0);
        assert!(book.genre.is_none());
    }
}
