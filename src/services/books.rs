//! Book resource operations

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult, Resource},
    models::{Book, BookQuery},
    repository::BookRepository,
};

use super::open_library::MetadataProvider;

/// Outcome of a read-by-ISBN, so the boundary can answer 200 vs 201
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsbnLookup {
    Local,
    Backfilled,
}

#[derive(Clone)]
pub struct BooksService {
    repository: Arc<dyn BookRepository>,
    metadata: Arc<dyn MetadataProvider>,
}

impl BooksService {
    pub fn new(repository: Arc<dyn BookRepository>, metadata: Arc<dyn MetadataProvider>) -> Self {
        Self { repository, metadata }
    }

    /// Search books with optional filters
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.find_all(query).await
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::book_not_found(id))
    }

    /// First book by an author
    pub async fn get_top_by_author(&self, author: &str) -> AppResult<Book> {
        self.repository
            .find_top_by_author(author)
            .await?
            .ok_or_else(|| AppError::book_not_found(author))
    }

    /// Get book by ISBN, backfilling from the metadata source on a local
    /// miss. The create step is not optional: a failed save is reported even
    /// though the lookup succeeded.
    pub async fn get_by_isbn(&self, isbn: &str) -> AppResult<(Book, IsbnLookup)> {
        if let Some(book) = self.repository.find_by_isbn(isbn).await? {
            return Ok((book, IsbnLookup::Local));
        }

        tracing::info!("isbn {} not in local catalog, consulting metadata source", isbn);
        let remote = self.metadata.lookup_by_isbn(isbn).await?;
        let created = self.repository.save(&remote.into_book()).await?;
        Ok((created, IsbnLookup::Backfilled))
    }

    /// Create a new book; the store assigns the id
    pub async fn create_book(&self, book: Book) -> AppResult<Book> {
        book.ensure_valid()?;
        let book = Book { id: 0, ..book };
        self.repository.save(&book).await
    }

    /// Update an existing book (full-record replace).
    /// Id-mismatch is checked before existence, uniformly across resources.
    pub async fn update_book(&self, id: i32, book: Book) -> AppResult<Book> {
        if book.id != id {
            return Err(AppError::IdMismatch { resource: Resource::Book });
        }
        if !self.repository.exists_by_id(id).await? {
            return Err(AppError::book_not_found(id));
        }
        book.ensure_valid()?;
        self.repository.save(&book).await
    }

    /// Delete a book
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        if !self.repository.exists_by_id(id).await? {
            return Err(AppError::book_not_found(id));
        }
        self.repository.delete_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::book::tests::sample_book;
    use crate::models::RemoteBook;
    use crate::repository::MockBookRepository;
    use crate::services::open_library::MockMetadataProvider;

    fn sample_remote(isbn: &str) -> RemoteBook {
        RemoteBook {
            isbn: isbn.to_string(),
            title: Some("Matilda".to_string()),
            subtitle: Some("A novel".to_string()),
            publish_date: Some("1988".to_string()),
            pages: Some(240),
            image_url: Some("https://covers.example.org/1.jpg".to_string()),
            publishers: vec!["Puffin".to_string()],
            authors: vec!["Roald Dahl".to_string()],
        }
    }

    fn service(repo: MockBookRepository, metadata: MockMetadataProvider) -> BooksService {
        BooksService::new(Arc::new(repo), Arc::new(metadata))
    }

    #[tokio::test]
    async fn get_by_isbn_local_hit_skips_the_gateway() {
        let mut repo = MockBookRepository::new();
        repo.expect_find_by_isbn()
            .withf(|isbn| isbn == "X")
            .returning(|_| Ok(Some(sample_book(3))));
        // no expectation on the metadata mock: a call would panic
        let metadata = MockMetadataProvider::new();

        let (book, outcome) = service(repo, metadata).get_by_isbn("X").await.unwrap();
        assert_eq!(book.id, 3);
        assert_eq!(outcome, IsbnLookup::Local);
    }

    #[tokio::test]
    async fn get_by_isbn_backfills_on_local_miss() {
        let mut repo = MockBookRepository::new();
        repo.expect_find_by_isbn().returning(|_| Ok(None));
        repo.expect_save()
            .withf(|book| book.id == 0 && book.isbn == "X" && book.author == "Roald Dahl")
            .times(1)
            .returning(|book| Ok(Book { id: 42, ..book.clone() }));

        let mut metadata = MockMetadataProvider::new();
        metadata
            .expect_lookup_by_isbn()
            .withf(|isbn| isbn == "X")
            .times(1)
            .returning(|isbn| Ok(sample_remote(isbn)));

        let (book, outcome) = service(repo, metadata).get_by_isbn("X").await.unwrap();
        assert_eq!(book.id, 42);
        assert_eq!(outcome, IsbnLookup::Backfilled);
    }

    #[tokio::test]
    async fn get_by_isbn_propagates_the_gateway_miss() {
        let mut repo = MockBookRepository::new();
        repo.expect_find_by_isbn().returning(|_| Ok(None));

        let mut metadata = MockMetadataProvider::new();
        metadata
            .expect_lookup_by_isbn()
            .returning(|isbn| Err(AppError::book_not_found(isbn)));

        let err = service(repo, metadata).get_by_isbn("X").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn get_by_isbn_reports_a_failed_backfill_save() {
        let mut repo = MockBookRepository::new();
        repo.expect_find_by_isbn().returning(|_| Ok(None));
        repo.expect_save()
            .returning(|_| Err(AppError::PersistenceIntegrity { resource: Resource::Book }));

        let mut metadata = MockMetadataProvider::new();
        metadata
            .expect_lookup_by_isbn()
            .returning(|isbn| Ok(sample_remote(isbn)));

        let err = service(repo, metadata).get_by_isbn("X").await.unwrap_err();
        assert!(matches!(err, AppError::PersistenceIntegrity { .. }));
    }

    #[tokio::test]
    async fn create_strips_a_client_supplied_id() {
        let mut repo = MockBookRepository::new();
        repo.expect_save()
            .withf(|book| book.id == 0)
            .times(1)
            .returning(|book| Ok(Book { id: 7, ..book.clone() }));

        let created = service(repo, MockMetadataProvider::new())
            .create_book(sample_book(99))
            .await
            .unwrap();
        assert_eq!(created.id, 7);
    }

    #[tokio::test]
    async fn create_rejects_an_invalid_book_before_saving() {
        // no save expectation: reaching the store would panic
        let repo = MockBookRepository::new();

        let mut book = sample_book(0);
        book.pages = 0;
        let err = service(repo, MockMetadataProvider::new())
            .create_book(book)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn update_checks_id_mismatch_before_existence() {
        // no exists expectation: the mismatch must short-circuit
        let repo = MockBookRepository::new();

        let err = service(repo, MockMetadataProvider::new())
            .update_book(9, sample_book(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IdMismatch { resource: Resource::Book }));
    }

    #[tokio::test]
    async fn update_of_a_missing_book_is_not_found() {
        let mut repo = MockBookRepository::new();
        repo.expect_exists_by_id().returning(|_| Ok(false));

        let err = service(repo, MockMetadataProvider::new())
            .update_book(5, sample_book(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_saves_after_both_checks() {
        let mut repo = MockBookRepository::new();
        repo.expect_exists_by_id().returning(|_| Ok(true));
        repo.expect_save()
            .withf(|book| book.id == 5)
            .times(1)
            .returning(|book| Ok(book.clone()));

        let updated = service(repo, MockMetadataProvider::new())
            .update_book(5, sample_book(5))
            .await
            .unwrap();
        assert_eq!(updated.id, 5);
    }

    #[tokio::test]
    async fn delete_of_a_missing_book_is_not_found() {
        let mut repo = MockBookRepository::new();
        repo.expect_exists_by_id().returning(|_| Ok(false));

        let err = service(repo, MockMetadataProvider::new())
            .delete_book(5)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_removes_an_existing_book() {
        let mut repo = MockBookRepository::new();
        repo.expect_exists_by_id().returning(|_| Ok(true));
        repo.expect_delete_by_id()
            .withf(|id| *id == 5)
            .times(1)
            .returning(|_| Ok(()));

        service(repo, MockMetadataProvider::new())
            .delete_book(5)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn get_by_id_maps_a_miss_to_not_found() {
        let mut repo = MockBookRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let err = service(repo, MockMetadataProvider::new())
            .get_by_id(5)
            .await
            .unwrap_err();
        match err {
            AppError::NotFound { resource, key } => {
                assert_eq!(resource, Resource::Book);
                assert_eq!(key, "5");
            }
            other => panic!("expected not-found, got {:?}", other),
        }
    }
}
