//! Loan (borrow) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    /// Null once the book has been removed from the catalog
    pub book_id: Option<i32>,
    pub user_id: i32,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub returned: bool,
}

impl Loan {
    /// True when the loan came back after its due date
    pub fn returned_late(&self) -> bool {
        matches!(self.return_date, Some(returned_at) if returned_at > self.due_date)
    }
}

/// Loan joined with the borrowed book, for display
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub book_id: Option<i32>,
    pub user_id: i32,
    pub username: String,
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub returned: bool,
    /// Unreturned and past its due date
    pub is_overdue: bool,
}

/// Borrow request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLoan {
    /// ISBN of the book to borrow
    #[validate(length(min = 1, message = "ISBN is required"))]
    pub isbn: String,
    /// Loan length in days (server default when omitted)
    pub duration_days: Option<i64>,
}

/// Return request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReturnLoan {
    pub loan_id: i32,
}

/// Query for a user's loans
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserLoansQuery {
    /// Include loans that have already been returned
    #[serde(default)]
    pub include_returned: bool,
}

/// Loan counters
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanCounts {
    pub total: i64,
    pub active: i64,
    pub overdue: i64,
}
