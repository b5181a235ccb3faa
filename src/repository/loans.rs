//! Loans repository for database operations
//!
//! Stock counts on `books` move together with the loan rows: every borrow and
//! return runs in a single transaction whose stock change is one conditional
//! `UPDATE`, so two borrowers racing for the last copy are serialized by the
//! row lock and the loser sees zero rows updated.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanCounts, LoanDetails},
};

const DETAILS_SELECT: &str = r#"
    SELECT l.id, l.book_id, l.user_id, u.username, b.title, b.isbn,
           l.loan_date, l.due_date, l.return_date, l.returned,
           (NOT l.returned AND l.due_date < $1) AS is_overdue
    FROM loans l
    JOIN users u ON u.id = l.user_id
    LEFT JOIN books b ON b.id = l.book_id
"#;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Take one copy of the book off the shelf and record the loan
    pub async fn borrow(
        &self,
        isbn: &str,
        user_id: i32,
        loan_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let book_id: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE books
            SET quantity = quantity - 1, updated_at = NOW()
            WHERE isbn = $1 AND quantity > 0
            RETURNING id
            "#,
        )
        .bind(isbn)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(book_id) = book_id else {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
                    .bind(isbn)
                    .fetch_one(&mut *tx)
                    .await?;
            tx.rollback().await?;

            return Err(if exists {
                AppError::Unavailable(format!("No copies of {} are available", isbn))
            } else {
                AppError::NotFound(format!("Book with ISBN {} not found", isbn))
            });
        };

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (book_id, user_id, loan_date, due_date, returned)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(loan_date)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(loan)
    }

    /// Close an active loan owned by `user_id` and put the copy back on the shelf
    pub async fn return_loan(
        &self,
        loan_id: i32,
        user_id: i32,
        return_date: DateTime<Utc>,
    ) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET returned = TRUE, return_date = $3
            WHERE id = $1 AND user_id = $2 AND NOT returned
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(user_id)
        .bind(return_date)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No active loan {} for this user", loan_id)))?;

        if let Some(book_id) = loan.book_id {
            sqlx::query("UPDATE books SET quantity = quantity + 1, updated_at = NOW() WHERE id = $1")
                .bind(book_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(loan)
    }

    /// Loans belonging to a user, newest first
    pub async fn list_for_user(
        &self,
        user_id: i32,
        include_returned: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<LoanDetails>> {
        let sql = format!(
            "{} WHERE l.user_id = $2 AND ($3 OR NOT l.returned) ORDER BY l.loan_date DESC, l.id DESC",
            DETAILS_SELECT
        );

        let loans = sqlx::query_as::<_, LoanDetails>(&sql)
            .bind(now)
            .bind(user_id)
            .bind(include_returned)
            .fetch_all(&self.pool)
            .await?;

        Ok(loans)
    }

    /// Unreturned loans past their due date, most overdue first
    pub async fn list_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<LoanDetails>> {
        let sql = format!(
            "{} WHERE NOT l.returned AND l.due_date < $1 ORDER BY l.due_date, l.id",
            DETAILS_SELECT
        );

        let loans = sqlx::query_as::<_, LoanDetails>(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;

        Ok(loans)
    }

    /// Total, active and overdue loan counts
    pub async fn counts(&self, now: DateTime<Utc>) -> AppResult<LoanCounts> {
        let counts = sqlx::query_as::<_, LoanCounts>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE NOT returned) AS active,
                   COUNT(*) FILTER (WHERE NOT returned AND due_date < $1) AS overdue
            FROM loans
            "#,
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }
}
