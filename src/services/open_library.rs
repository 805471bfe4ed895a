//! OpenLibrary client service for metadata backfill
//!
//! Consulted only on a local-catalog miss. The functional contract is a
//! single lookup-by-ISBN returning a normalized book-shaped record; transport
//! failures and upstream misses are kept distinct.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;

use crate::{
    config::OpenLibraryConfig,
    error::{AppError, AppResult},
    models::RemoteBook,
};

/// Contract of the external metadata source
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Resolves an ISBN to a normalized record. Fails with `NotFound` when
    /// the upstream has no entry for the ISBN, and with `ExternalService`
    /// when the call itself cannot complete (timeout, transport failure,
    /// malformed payload).
    async fn lookup_by_isbn(&self, isbn: &str) -> AppResult<RemoteBook>;
}

/// Wire shape of one OpenLibrary `jscmd=data` entry
#[derive(Debug, Deserialize)]
struct OpenLibraryBook {
    title: Option<String>,
    subtitle: Option<String>,
    #[serde(rename = "number_of_pages")]
    pages: Option<i32>,
    publish_date: Option<String>,
    #[serde(default)]
    authors: Vec<NamedEntry>,
    #[serde(default)]
    publishers: Vec<NamedEntry>,
    cover: Option<Cover>,
}

#[derive(Debug, Deserialize)]
struct NamedEntry {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Cover {
    medium: Option<String>,
}

/// The response body is an object keyed by "ISBN:<isbn>"; a successful call
/// with no such key means the upstream has no entry.
fn parse_response(
    isbn: &str,
    mut body: HashMap<String, OpenLibraryBook>,
) -> AppResult<RemoteBook> {
    let entry = body
        .remove(&format!("ISBN:{}", isbn))
        .ok_or_else(|| AppError::book_not_found(isbn))?;

    Ok(RemoteBook {
        isbn: isbn.to_string(),
        title: entry.title,
        subtitle: entry.subtitle,
        publish_date: entry.publish_date,
        pages: entry.pages,
        image_url: entry.cover.and_then(|c| c.medium),
        publishers: entry.publishers.into_iter().filter_map(|p| p.name).collect(),
        authors: entry.authors.into_iter().filter_map(|a| a.name).collect(),
    })
}

#[derive(Clone)]
pub struct OpenLibraryService {
    client: reqwest::Client,
    base_url: String,
}

impl OpenLibraryService {
    pub fn new(config: &OpenLibraryConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MetadataProvider for OpenLibraryService {
    async fn lookup_by_isbn(&self, isbn: &str) -> AppResult<RemoteBook> {
        let url = format!(
            "{}/api/books?bibkeys=ISBN:{}&format=json&jscmd=data",
            self.base_url, isbn
        );
        tracing::debug!("Metadata lookup: {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::ExternalService(format!("lookup for isbn {} timed out", isbn))
            } else {
                AppError::ExternalService(format!("lookup for isbn {} failed: {}", isbn, e))
            }
        })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "metadata service answered {}",
                response.status()
            )));
        }

        let body: HashMap<String, OpenLibraryBook> = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("malformed metadata response: {}", e)))?;

        parse_response(isbn, body)
    }
}
