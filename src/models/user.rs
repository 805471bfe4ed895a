//! User (library member) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};

use super::book::Book;

/// Membership subtypes, a closed set discriminated by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UserKind {
    Student {
        /// School year the student is enrolled in
        year: String,
    },
    Professor {
        /// Subject the professor teaches
        subject: String,
    },
}

/// Full user model (API shape). The owned-books collection is mutated only
/// through [`User::add_book`] / [`User::remove_book`]; reads get a slice view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct User {
    #[serde(default)]
    pub id: i32,
    #[validate(length(min = 1, message = "user username can't be empty"))]
    pub username: String,
    #[validate(length(min = 1, message = "user name can't be empty"))]
    pub name: String,
    /// Stored hashed (argon2); plaintext only transits inbound payloads
    #[serde(skip_serializing)]
    #[validate(length(min = 1, message = "user password can't be empty"))]
    pub password: String,
    pub birthdate: NaiveDate,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub kind: Option<UserKind>,
    #[serde(default)]
    books: Vec<Book>,
}

impl User {
    /// Owned books, in insertion order
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Returns the record with a replaced id (the store assigns real ones)
    pub fn with_id(self, id: i32) -> Self {
        Self { id, ..self }
    }

    /// Returns the record with a replaced (hashed) password
    pub fn with_password(self, password: String) -> Self {
        Self { password, ..self }
    }

    /// Adds a book to the user's collection. Ownership is keyed by book id;
    /// owning the same book twice is a conflict.
    pub fn add_book(&mut self, book: Book) -> AppResult<()> {
        if self.books.iter().any(|b| b.id == book.id) {
            return Err(AppError::BookAlreadyOwned {
                user_id: self.id,
                book_id: book.id,
            });
        }
        self.books.push(book);
        Ok(())
    }

    /// Removes a book from the collection. Removing a book the user does not
    /// own is a no-op, which keeps remove safe to retry.
    pub fn remove_book(&mut self, book_id: i32) {
        self.books.retain(|b| b.id != book_id);
    }

    /// Checks field invariants plus the no-duplicate-ownership rule
    /// (a client-supplied record may carry an arbitrary books list).
    pub fn ensure_valid(&self) -> AppResult<()> {
        validator::Validate::validate(self).map_err(AppError::from)?;

        let mut seen = std::collections::HashSet::new();
        for book in &self.books {
            if !seen.insert(book.id) {
                return Err(AppError::Validation {
                    field: "books".to_string(),
                    reason: format!("book {} appears more than once", book.id),
                });
            }
        }
        Ok(())
    }
}

/// Internal row structure for database queries; subtype columns are nullable
/// and folded into [`UserKind`] by the discriminator.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub password: String,
    pub birthdate: NaiveDate,
    pub user_type: Option<String>,
    pub student_year: Option<String>,
    pub subject: Option<String>,
}

impl UserRow {
    /// Builds the API model from a row and its separately-loaded books
    pub fn into_user(self, books: Vec<Book>) -> User {
        let kind = match self.user_type.as_deref() {
            Some("student") => Some(UserKind::Student {
                year: self.student_year.unwrap_or_default(),
            }),
            Some("professor") => Some(UserKind::Professor {
                subject: self.subject.unwrap_or_default(),
            }),
            _ => None,
        };

        User {
            id: self.id,
            username: self.username,
            name: self.name,
            password: self.password,
            birthdate: self.birthdate,
            kind,
            books,
        }
    }
}

/// Columns a [`UserKind`] persists to
pub fn kind_columns(kind: &Option<UserKind>) -> (Option<&'static str>, Option<&str>, Option<&str>) {
    match kind {
        Some(UserKind::Student { year }) => (Some("student"), Some(year.as_str()), None),
        Some(UserKind::Professor { subject }) => (Some("professor"), None, Some(subject.as_str())),
        None => (None, None, None),
    }
}

/// User search query parameters. `name` matches case-insensitively as a
/// substring; `begin`/`end` bound the birthdate independently.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    pub name: Option<String>,
    /// Lower birthdate bound (inclusive, ISO date)
    pub begin: Option<String>,
    /// Upper birthdate bound (inclusive, ISO date)
    pub end: Option<String>,
    /// Zero-based page index
    pub from: Option<i64>,
    /// Page size
    pub size: Option<i64>,
    /// Sort key (whitelisted; defaults to id)
    pub sort: Option<String>,
}
