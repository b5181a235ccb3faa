//! Loan management service

use chrono::{Duration, Utc};

use crate::{
    config::LoansConfig,
    error::{AppError, AppResult},
    models::{
        book::compact_isbn,
        loan::{CreateLoan, Loan, LoanDetails},
        user::User,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    config: LoansConfig,
}

impl LoansService {
    pub fn new(repository: Repository, config: LoansConfig) -> Self {
        Self { repository, config }
    }

    /// Resolve the requested loan length against the configured bounds
    pub fn loan_duration(&self, requested_days: Option<i64>) -> AppResult<Duration> {
        let days = requested_days.unwrap_or(self.config.default_duration_days);
        if days < 1 || days > self.config.max_duration_days {
            return Err(AppError::Validation(format!(
                "duration_days must be between 1 and {}",
                self.config.max_duration_days
            )));
        }
        Ok(Duration::days(days))
    }

    /// Borrow a book
    pub async fn borrow(&self, user: &User, request: &CreateLoan) -> AppResult<Loan> {
        let duration = self.loan_duration(request.duration_days)?;
        let isbn = compact_isbn(&request.isbn);
        let now = Utc::now();

        let loan = self
            .repository
            .loans
            .borrow(&isbn, user.id, now, now + duration)
            .await?;

        tracing::info!(
            loan_id = loan.id,
            user_id = user.id,
            isbn = %isbn,
            due_date = %loan.due_date,
            "Loan created"
        );
        Ok(loan)
    }

    /// Return a loan; the flag tells whether it came back after its due date
    pub async fn return_loan(&self, user: &User, loan_id: i32) -> AppResult<(Loan, bool)> {
        let loan = self
            .repository
            .loans
            .return_loan(loan_id, user.id, Utc::now())
            .await?;

        let overdue = loan.returned_late();
        if overdue {
            tracing::warn!(
                loan_id = loan.id,
                user_id = user.id,
                due_date = %loan.due_date,
                "Overdue loan returned"
            );
        } else {
            tracing::info!(loan_id = loan.id, user_id = user.id, "Loan returned");
        }

        Ok((loan, overdue))
    }

    /// Loans of the given user
    pub async fn list_for_user(&self, user: &User, include_returned: bool) -> AppResult<Vec<LoanDetails>> {
        self.repository
            .loans
            .list_for_user(user.id, include_returned, Utc::now())
            .await
    }

    /// All overdue loans (admin only)
    pub async fn list_overdue(&self, user: &User) -> AppResult<Vec<LoanDetails>> {
        user.require_admin()?;
        self.repository.loans.list_overdue(Utc::now()).await
    }
}
