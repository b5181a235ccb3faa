//! Statistics service

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, repository::Repository};

/// Library-wide counters
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LibraryStats {
    pub total_books: i64,
    pub available_books: i64,
    pub total_quantity: i64,
    pub total_loans: i64,
    pub active_loans: i64,
    pub overdue_loans: i64,
    pub total_users: i64,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn library_stats(&self) -> AppResult<LibraryStats> {
        let books = self.repository.books.stats().await?;
        let loans = self.repository.loans.counts(Utc::now()).await?;
        let total_users = self.repository.users.count().await?;

        Ok(LibraryStats {
            total_books: books.total_books,
            available_books: books.available_books,
            total_quantity: books.total_quantity,
            total_loans: loans.total,
            active_loans: loans.active,
            overdue_loans: loans.overdue,
            total_users,
        })
    }
}
