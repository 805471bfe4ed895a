//! User resource operations and ownership mutation

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};

use crate::{
    error::{AppError, AppResult, Resource},
    models::{User, UserQuery},
    repository::{BookRepository, UserRepository},
};

/// Book-list mutation actions, a closed set matched case-insensitively
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookListAction {
    Add,
    Remove,
}

impl BookListAction {
    pub fn parse(token: &str) -> AppResult<Self> {
        match token.to_lowercase().as_str() {
            "add" => Ok(BookListAction::Add),
            "remove" => Ok(BookListAction::Remove),
            _ => Err(AppError::UnrecognizedAction {
                action: token.to_string(),
            }),
        }
    }
}

#[derive(Clone)]
pub struct UsersService {
    users: Arc<dyn UserRepository>,
    books: Arc<dyn BookRepository>,
}

impl UsersService {
    pub fn new(users: Arc<dyn UserRepository>, books: Arc<dyn BookRepository>) -> Self {
        Self { users, books }
    }

    /// Search users with optional name/birthdate-range filters
    pub async fn search_users(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        self.users.find_all(query).await
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::user_not_found(id))
    }

    /// Get user by unique username
    pub async fn get_by_username(&self, username: &str) -> AppResult<User> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::user_not_found(username))
    }

    /// Create a new user; the inbound plaintext password is hashed before
    /// anything is persisted, and the store assigns the id.
    pub async fn create_user(&self, user: User) -> AppResult<User> {
        user.ensure_valid()?;
        let password = self.hash_password(&user.password)?;
        let user = user.with_id(0).with_password(password);
        self.users.save(&user).await
    }

    /// Update an existing user (full-record replace).
    /// Id-mismatch is checked before existence, uniformly across resources.
    pub async fn update_user(&self, id: i32, user: User) -> AppResult<User> {
        if user.id != id {
            return Err(AppError::IdMismatch { resource: Resource::User });
        }
        if !self.users.exists_by_id(id).await? {
            return Err(AppError::user_not_found(id));
        }
        user.ensure_valid()?;
        let password = self.hash_password(&user.password)?;
        let user = user.with_password(password);
        self.users.save(&user).await
    }

    /// Delete a user and detach every ownership edge
    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        if !self.users.exists_by_id(id).await? {
            return Err(AppError::user_not_found(id));
        }
        self.users.delete_by_id(id).await
    }

    /// Adds or removes a book from a user's collection.
    ///
    /// The resolution order is a fixed contract so error precedence stays
    /// deterministic: user lookup, then book lookup, then the action token,
    /// then the ownership rule, then one save.
    pub async fn modify_book_list(
        &self,
        user_id: i32,
        book_id: i32,
        action: &str,
    ) -> AppResult<User> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::user_not_found(user_id))?;
        let book = self
            .books
            .find_by_id(book_id)
            .await?
            .ok_or_else(|| AppError::book_not_found(book_id))?;

        match BookListAction::parse(action)? {
            BookListAction::Add => {
                user.add_book(book)?;
                tracing::info!("user {} takes book {}", user_id, book_id);
            }
            BookListAction::Remove => {
                user.remove_book(book.id);
                tracing::info!("user {} returns book {}", user_id, book_id);
            }
        }

        self.users.save(&user).await
    }

    /// Hash a password using Argon2
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
