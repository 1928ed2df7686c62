//! Business logic services

pub mod books;
pub mod cache;
pub mod items;
pub mod loans;
pub mod orders;
pub mod users;

use crate::{auth::TokenCodec, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub books: books::BooksService,
    pub loans: loans::LoansService,
    pub items: items::ItemsService,
    pub orders: orders::OrdersService,
    pub cache: cache::ResponseCache,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, tokens: TokenCodec, cache: cache::ResponseCache) -> Self {
        Self {
            users: users::UsersService::new(repository.clone(), tokens, cache.clone()),
            books: books::BooksService::new(repository.clone(), cache.clone()),
            loans: loans::LoansService::new(repository.clone(), cache.clone()),
            items: items::ItemsService::new(repository.clone(), cache.clone()),
            orders: orders::OrdersService::new(repository.clone(), cache.clone()),
            cache,
            repository,
        }
    }
}
