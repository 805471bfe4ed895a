//! Repository layer: storage contracts and their Postgres implementations

pub mod books;
pub mod query;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Book, BookQuery, User, UserQuery},
};

/// Storage contract for books
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>>;
    async fn exists_by_id(&self, id: i32) -> AppResult<bool>;
    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>>;
    async fn find_top_by_author(&self, author: &str) -> AppResult<Option<Book>>;
    /// Filtered, paginated listing; returns the page and the unpaged total
    async fn find_all(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)>;
    /// Single write point: inserts when `id` is 0, updates otherwise.
    /// A rejected write surfaces as `PersistenceIntegrity`.
    async fn save(&self, book: &Book) -> AppResult<Book>;
    async fn delete_by_id(&self, id: i32) -> AppResult<()>;
}

/// Storage contract for users
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>>;
    async fn exists_by_id(&self, id: i32) -> AppResult<bool>;
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn find_all(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)>;
    /// Single write point: persists the row and replaces the ownership edges
    /// in one transaction. A rejected write surfaces as `PersistenceIntegrity`.
    async fn save(&self, user: &User) -> AppResult<User>;
    /// Removes the user and detaches every ownership edge
    async fn delete_by_id(&self, id: i32) -> AppResult<()>;
}

/// Main repository struct wiring the Postgres implementations
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::PgBookRepository::new(pool.clone())),
            users: Arc::new(users::PgUserRepository::new(pool)),
        }
    }
}
