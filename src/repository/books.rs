//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult, Resource},
    models::{Book, BookQuery},
};

use super::{query, query::Bind, BookRepository};

const BOOK_COLUMNS: &str = "id, genre, author, image, title, subtitle, publisher, year, pages, isbn";

#[derive(Clone)]
pub struct PgBookRepository {
    pool: Pool<Postgres>,
}

impl PgBookRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = $1",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    async fn exists_by_id(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        // ISBN is a lookup key, not a uniqueness constraint: the lowest id wins
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE isbn = $1 ORDER BY id LIMIT 1",
            BOOK_COLUMNS
        ))
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    async fn find_top_by_author(&self, author: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE author = $1 ORDER BY id LIMIT 1",
            BOOK_COLUMNS
        ))
        .bind(author)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    async fn find_all(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let (conditions, binds) = query::book_filters(query);
        let where_clause = query::where_clause(&conditions);
        let page = query::book_page(query.from, query.size, query.sort.as_deref());

        let count_sql = format!("SELECT COUNT(*) FROM books {}", where_clause);
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
            "SELECT {} FROM books {} ORDER BY {} LIMIT {} OFFSET {}",
            BOOK_COLUMNS, where_clause, page.order_by, page.limit, page.offset
        );
        let mut select_query = sqlx::query_as::<_, Book>(&select_sql);
        for bind in &binds {
            select_query = match bind {
                Bind::Str(s) => select_query.bind(s.clone()),
                Bind::Int(i) => select_query.bind(*i),
                Bind::Date(d) => select_query.bind(*d),
            };
        }
        let books = select_query.fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    async fn save(&self, book: &Book) -> AppResult<Book> {
        let result = if book.id == 0 {
            sqlx::query_as::<_, Book>(&format!(
                r#"
                INSERT INTO books (genre, author, image, title, subtitle, publisher, year, pages, isbn)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING {}
                "#,
                BOOK_COLUMNS
            ))
            .bind(&book.genre)
            .bind(&book.author)
            .bind(&book.image)
            .bind(&book.title)
            .bind(&book.subtitle)
            .bind(&book.publisher)
            .bind(&book.year)
            .bind(book.pages)
            .bind(&book.isbn)
            .fetch_one(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Book>(&format!(
                r#"
                UPDATE books
                SET genre = $1, author = $2, image = $3, title = $4, subtitle = $5,
                    publisher = $6, year = $7, pages = $8, isbn = $9
                WHERE id = $10
                RETURNING {}
                "#,
                BOOK_COLUMNS
            ))
            .bind(&book.genre)
            .bind(&book.author)
            .bind(&book.image)
            .bind(&book.title)
            .bind(&book.subtitle)
            .bind(&book.publisher)
            .bind(&book.year)
            .bind(book.pages)
            .bind(&book.isbn)
            .bind(book.id)
            .fetch_one(&self.pool)
            .await
        };

        result.map_err(|e| {
            tracing::error!("Failed to save book: {:?}", e);
            AppError::PersistenceIntegrity { resource: Resource::Book }
        })
    }

    async fn delete_by_id(&self, id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
