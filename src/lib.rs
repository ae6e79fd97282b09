pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod middleware;
pub mod notify;
pub mod response;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult};

use notify::Mailer;
use utils::jwt::TokenIssuer;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub tokens: TokenIssuer,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = TokenIssuer::from_config(&config);
        Self {
            db,
            config,
            tokens,
            mailer,
        }
    }
}
