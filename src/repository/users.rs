//! Users repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult, Resource},
    models::{
        user::{kind_columns, UserRow},
        Book, User, UserQuery,
    },
};

use super::{query, query::Bind, UserRepository};

const USER_COLUMNS: &str = "id, username, name, password, birthdate, user_type, student_year, subject";

#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Owned books for a user, in insertion order
    async fn books_for(&self, user_id: i32) -> Result<Vec<Book>, sqlx::Error> {
        sqlx::query_as::<_, Book>(
            r#"
            SELECT b.id, b.genre, b.author, b.image, b.title, b.subtitle,
                   b.publisher, b.year, b.pages, b.isbn
            FROM books b
            JOIN user_books ub ON ub.book_id = b.id
            WHERE ub.user_id = $1
            ORDER BY ub.ordinal
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn save_inner(&self, user: &User) -> Result<User, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let (user_type, student_year, subject) = kind_columns(&user.kind);

        let row = if user.id == 0 {
            sqlx::query_as::<_, UserRow>(&format!(
                r#"
                INSERT INTO users (username, name, password, birthdate, user_type, student_year, subject)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {}
                "#,
                USER_COLUMNS
            ))
            .bind(&user.username)
            .bind(&user.name)
            .bind(&user.password)
            .bind(user.birthdate)
            .bind(user_type)
            .bind(student_year)
            .bind(subject)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query_as::<_, UserRow>(&format!(
                r#"
                UPDATE users
                SET username = $1, name = $2, password = $3, birthdate = $4,
                    user_type = $5, student_year = $6, subject = $7
                WHERE id = $8
                RETURNING {}
                "#,
                USER_COLUMNS
            ))
            .bind(&user.username)
            .bind(&user.name)
            .bind(&user.password)
            .bind(user.birthdate)
            .bind(user_type)
            .bind(student_year)
            .bind(subject)
            .bind(user.id)
            .fetch_one(&mut *tx)
            .await?
        };

        // Replace the ownership edges; ordinal preserves insertion order
        sqlx::query("DELETE FROM user_books WHERE user_id = $1")
            .bind(row.id)
            .execute(&mut *tx)
            .await?;
        for (ordinal, book) in user.books().iter().enumerate() {
            sqlx::query("INSERT INTO user_books (user_id, book_id, ordinal) VALUES ($1, $2, $3)")
                .bind(row.id)
                .bind(book.id)
                .bind(ordinal as i32)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        let books = self.books_for(row.id).await?;
        Ok(row.into_user(books))
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(None),
            Some(row) => {
                let books = self.books_for(row.id).await?;
                Ok(Some(row.into_user(books)))
            }
        }
    }

    async fn exists_by_id(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE LOWER(username) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(None),
            Some(row) => {
                let books = self.books_for(row.id).await?;
                Ok(Some(row.into_user(books)))
            }
        }
    }

    async fn find_all(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        let (conditions, binds) = query::user_filters(query)?;
        let where_clause = query::where_clause(&conditions);
        let page = query::user_page(query.from, query.size, query.sort.as_deref());

        let count_sql = format!("SELECT COUNT(*) FROM users {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for bind in &binds {
            count_query = match bind {
                Bind::Str(s) => count_query.bind(s.clone()),
                Bind::Int(i) => count_query.bind(*i),
                Bind::Date(d) => count_query.bind(*d),
            };
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let select_sql = format!(
            "SELECT {} FROM users {} ORDER BY {} LIMIT {} OFFSET {}",
            USER_COLUMNS, where_clause, page.order_by, page.limit, page.offset
        );
        let mut select_query = sqlx::query_as::<_, UserRow>(&select_sql);
        for bind in &binds {
            select_query = match bind {
                Bind::Str(s) => select_query.bind(s.clone()),
                Bind::Int(i) => select_query.bind(*i),
                Bind::Date(d) => select_query.bind(*d),
            };
        }
        let rows = select_query.fetch_all(&self.pool).await?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            let books = self.books_for(row.id).await?;
            users.push(row.into_user(books));
        }

        Ok((users, total))
    }

    async fn save(&self, user: &User) -> AppResult<User> {
        self.save_inner(user).await.map_err(|e| {
            tracing::error!("Failed to save user: {:?}", e);
            AppError::PersistenceIntegrity { resource: Resource::User }
        })
    }

    async fn delete_by_id(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Detach the user from the ownership relation before removing the row
        sqlx::query("DELETE FROM user_books WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
