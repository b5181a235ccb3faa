//! Catalog management service

use crate::{
    error::{AppError, AppResult},
    models::book::{compact_isbn, Book, BookQuery, CatalogStats, CreateBook, ListQuery, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List books in id order
    pub async fn list_books(&self, query: &ListQuery) -> AppResult<Vec<Book>> {
        self.repository
            .books
            .list(query.skip.unwrap_or(0), query.limit)
            .await
    }

    /// Get book by ISBN
    pub async fn get_book(&self, isbn: &str) -> AppResult<Book> {
        self.repository.books.get_by_isbn(&compact_isbn(isbn)).await
    }

    /// Create a new book; ISBNs are unique once separators are removed
    pub async fn create_book(&self, mut book: CreateBook) -> AppResult<Book> {
        book.isbn = compact_isbn(&book.isbn);
        if self.repository.books.isbn_exists(&book.isbn).await? {
            return Err(AppError::Conflict(
                "Book with this ISBN already exists".to_string(),
            ));
        }

        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = created.id, isbn = %created.isbn, "Book created");
        Ok(created)
    }

    /// Update an existing book
    pub async fn update_book(&self, isbn: &str, book: UpdateBook) -> AppResult<Book> {
        let isbn = compact_isbn(isbn);
        if compact_isbn(&book.isbn) != isbn {
            return Err(AppError::BadRequest(
                "ISBN in path must match book's ISBN".to_string(),
            ));
        }

        let updated = self.repository.books.update(&isbn, &book).await?;
        tracing::info!(book_id = updated.id, isbn = %updated.isbn, "Book updated");
        Ok(updated)
    }

    /// Delete a book
    pub async fn delete_book(&self, isbn: &str) -> AppResult<()> {
        let isbn = compact_isbn(isbn);
        self.repository.books.delete(&isbn).await?;
        tracing::info!(isbn = %isbn, "Book deleted");
        Ok(())
    }

    /// Search books with text and quantity filters
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        if let (Some(min), Some(max)) = (query.min_quantity, query.max_quantity) {
            if min > max {
                return Err(AppError::BadRequest(
                    "min_quantity must not exceed max_quantity".to_string(),
                ));
            }
        }

        self.repository.books.search(query).await
    }

    /// Catalog statistics
    pub async fn stats(&self) -> AppResult<CatalogStats> {
        self.repository.books.stats().await
    }
}
