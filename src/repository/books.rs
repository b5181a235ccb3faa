//! Books repository for database operations

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::book::{compact_isbn, AuthorCount, Book, BookQuery, CatalogStats, CreateBook, UpdateBook},
};

use super::conflict_on_unique;

/// Build an ILIKE pattern matching `text` anywhere, with wildcards in `text` taken literally
pub fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List books ordered by id
    pub async fn list(&self, skip: i64, limit: Option<i64>) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books ORDER BY id OFFSET $1 LIMIT $2",
        )
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Get book by ISBN
    pub async fn get_by_isbn(&self, isbn: &str) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = $1")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with ISBN {} not found", isbn)))
    }

    /// Check if ISBN already exists
    pub async fn isbn_exists(&self, isbn: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
            .bind(isbn)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Insert a new book
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Book with this ISBN already exists"))
    }

    /// Update the fields present in `book`
    pub async fn update(&self, isbn: &str, book: &UpdateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = COALESCE($2, title),
                author = COALESCE($3, author),
                quantity = COALESCE($4, quantity),
                updated_at = NOW()
            WHERE isbn = $1
            RETURNING *
            "#,
        )
        .bind(isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.quantity)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with ISBN {} not found", isbn)))
    }

    /// Delete a book that has no loans outstanding.
    ///
    /// The book row is locked first, so a borrow in flight either commits
    /// before the loan check runs or finds the book gone.
    pub async fn delete(&self, isbn: &str) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let book_id: Option<i32> =
            sqlx::query_scalar("SELECT id FROM books WHERE isbn = $1 FOR UPDATE")
                .bind(isbn)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(book_id) = book_id else {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("Book with ISBN {} not found", isbn)));
        };

        let on_loan: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE book_id = $1 AND NOT returned)",
        )
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        if on_loan {
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "Book has copies on loan and cannot be deleted".to_string(),
            ));
        }

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Search books by text and quantity bounds
    pub async fn search(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM books WHERE TRUE");

        if let Some(text) = query.text() {
            let pattern = contains_pattern(text);
            // Stored ISBNs carry no separators
            let compact = compact_isbn(text);
            let isbn_pattern = if compact.is_empty() {
                pattern.clone()
            } else {
                contains_pattern(&compact)
            };
            builder
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR author ILIKE ")
                .push_bind(pattern)
                .push(" OR isbn ILIKE ")
                .push_bind(isbn_pattern)
                .push(")");
        }

        if let Some(min) = query.min_quantity {
            builder.push(" AND quantity >= ").push_bind(min);
        }

        if let Some(max) = query.max_quantity {
            builder.push(" AND quantity <= ").push_bind(max);
        }

        builder.push(" ORDER BY id");

        let books = builder
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Catalog statistics
    pub async fn stats(&self) -> AppResult<CatalogStats> {
        let (total_books, available_books, total_quantity): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE quantity > 0),
                   COALESCE(SUM(quantity), 0)::BIGINT
            FROM books
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let by_author = sqlx::query_as::<_, AuthorCount>(
            r#"
            SELECT author, COUNT(*) AS count
            FROM books
            GROUP BY author
            ORDER BY count DESC, author
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(CatalogStats {
            total_books,
            available_books,
            total_quantity,
            by_author,
        })
    }
}
