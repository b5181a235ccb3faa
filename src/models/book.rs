//! Book (catalog) model and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// ISBN-10 (last character may be `X`) or ISBN-13, once separators are removed
static ISBN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{9}[\dX]|\d{13})$").expect("valid ISBN pattern"));

/// Strip hyphens and spaces from an ISBN
pub fn compact_isbn(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| *c != '-' && *c != ' ')
        .collect::<String>()
        .to_ascii_uppercase()
}

pub fn is_valid_isbn(isbn: &str) -> bool {
    let trimmed = isbn.trim();
    trimmed == isbn && ISBN_RE.is_match(&compact_isbn(isbn))
}

fn validate_isbn(isbn: &str) -> Result<(), ValidationError> {
    if is_valid_isbn(isbn) {
        Ok(())
    } else {
        let mut err = ValidationError::new("isbn");
        err.message = Some("Invalid ISBN format. Must be ISBN-10 or ISBN-13".into());
        Err(err)
    }
}

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    /// Copies currently on the shelf
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    #[validate(length(min = 2, max = 100, message = "Author must be 2 to 100 characters"))]
    pub author: String,
    #[validate(custom(function = "validate_isbn"))]
    pub isbn: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "Quantity must be zero or more"))]
    pub quantity: i32,
}

/// Update book request. `isbn` must match the path; omitted fields are kept.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(custom(function = "validate_isbn"))]
    pub isbn: String,
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 2, max = 100, message = "Author must be 2 to 100 characters"))]
    pub author: Option<String>,
    #[validate(range(min = 0, message = "Quantity must be zero or more"))]
    pub quantity: Option<i32>,
}

/// Book search parameters
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Case-insensitive text matched against title, author and ISBN
    #[serde(alias = "text")]
    pub q: Option<String>,
    #[validate(range(min = 0, message = "min_quantity must be zero or more"))]
    pub min_quantity: Option<i32>,
    #[validate(range(min = 0, message = "max_quantity must be zero or more"))]
    pub max_quantity: Option<i32>,
}

impl BookQuery {
    /// Search text with surrounding whitespace removed; blank text means no filter
    pub fn text(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Listing parameters
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    #[validate(range(min = 0, message = "skip must be zero or more"))]
    pub skip: Option<i64>,
    #[validate(range(min = 1, max = 1000, message = "limit must be between 1 and 1000"))]
    pub limit: Option<i64>,
}

/// Number of titles by one author
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AuthorCount {
    pub author: String,
    pub count: i64,
}

/// Catalog statistics
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogStats {
    pub total_books: i64,
    /// Books with at least one copy on the shelf
    pub available_books: i64,
    /// Sum of all quantities
    pub total_quantity: i64,
    pub by_author: Vec<AuthorCount>,
}
