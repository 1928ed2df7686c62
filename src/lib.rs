//! Bibliotheca Library Management System
//!
//! A REST JSON API over a library catalog (users, books, loans) and a small
//! shop (items, orders), backed by SQLite.

use std::sync::Arc;

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use auth::TokenCodec;
use repository::Repository;
use services::{cache::ResponseCache, Services};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<Services>,
    pub tokens: Arc<TokenCodec>,
}

impl AppState {
    pub fn new(config: AppConfig, repository: Repository, cache: ResponseCache) -> Self {
        let tokens = TokenCodec::new(&config.auth);
        let services = Services::new(repository, tokens.clone(), cache);
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
            tokens: Arc::new(tokens),
        }
    }
}
