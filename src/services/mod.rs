//! Business logic services

pub mod books;
pub mod open_library;
pub mod users;

use std::sync::Arc;

use crate::{config::OpenLibraryConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub users: users::UsersService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, openlibrary: OpenLibraryConfig) -> AppResult<Self> {
        let metadata = Arc::new(open_library::OpenLibraryService::new(&openlibrary)?);

        Ok(Self {
            books: books::BooksService::new(repository.books.clone(), metadata),
            users: users::UsersService::new(repository.users, repository.books),
        })
    }
}
