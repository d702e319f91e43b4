use std::{path::PathBuf, time::Duration};

use sea_orm::DatabaseConnection;

use crate::{
    config::AppConfig,
    repository::{
        AlbumRepository, CartRepository, OrderRepository, Repository, ReviewRepository,
        UserRepository,
    },
    services::token_service::TokenService,
};

/// Everything a handler needs, built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub albums: AlbumRepository,
    pub users: UserRepository,
    pub carts: CartRepository,
    pub orders: OrderRepository,
    pub reviews: ReviewRepository,
    pub tokens: TokenService,
    pub data_dir: PathBuf,
}

impl AppState {
    pub fn new(conn: DatabaseConnection, config: &AppConfig) -> Self {
        let timeout = Duration::from_secs(config.store_timeout_secs);
        Self {
            albums: Repository::new(conn.clone(), timeout, "album"),
            users: Repository::new(conn.clone(), timeout, "user"),
            carts: Repository::new(conn.clone(), timeout, "cart"),
            orders: Repository::new(conn.clone(), timeout, "order"),
            reviews: Repository::new(conn, timeout, "review"),
            tokens: TokenService::new(&config.jwt_secret, config.token_ttl()),
            data_dir: config.data_dir.clone(),
        }
    }
}
