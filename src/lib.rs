//! Libris Library Management System
//!
//! A REST JSON API for managing a library's book catalog, user accounts
//! and loans, backed by PostgreSQL.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Wire repositories and services over an existing pool
    pub fn new(pool: sqlx::PgPool, config: &AppConfig) -> Self {
        let services = services::Services::new(repository::Repository::new(pool), config);
        Self {
            services: Arc::new(services),
        }
    }
}
