//! Remote book (metadata lookup result) model

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::book::Book;

const UNKNOWN: &str = "Unknown";

/// Normalized record a metadata lookup yields before it is persisted locally.
/// Author and publisher lists keep the upstream ordering.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RemoteBook {
    pub isbn: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub publish_date: Option<String>,
    pub pages: Option<i32>,
    pub image_url: Option<String>,
    pub publishers: Vec<String>,
    pub authors: Vec<String>,
}

impl RemoteBook {
    /// Maps the remote record into a persistable book: first author and
    /// publisher win, empty lists and missing fields fall back to "Unknown"
    /// so the stored record satisfies the required-field invariants.
    pub fn into_book(self) -> Book {
        Book {
            id: 0,
            genre: None,
            author: self.authors.into_iter().next().unwrap_or_else(|| UNKNOWN.to_string()),
            image: self.image_url.unwrap_or_else(|| UNKNOWN.to_string()),
            title: self.title.unwrap_or_else(|| UNKNOWN.to_string()),
            subtitle: self.subtitle.unwrap_or_else(|| UNKNOWN.to_string()),
            publisher: self
                .publishers
                .into_iter()
                .next()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            year: self.publish_date.unwrap_or_else(|| UNKNOWN.to_string()),
            pages: self.pages.unwrap_or(1),
            isbn: self.isbn,
        }
    }
}
