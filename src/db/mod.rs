use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::config::Config;
use crate::error::{AppError, AppResult};

pub async fn connect(config: &Config) -> AppResult<DatabaseConnection> {
    connect_url(&config.database_url).await
}

pub async fn connect_url(url: &str) -> AppResult<DatabaseConnection> {
    let mut options = ConnectOptions::new(url.to_owned());
    // An in-memory SQLite database exists per connection, so the pool must
    // hold exactly one.
    if url.starts_with("sqlite::memory:") {
        options.max_connections(1).min_connections(1);
    }
    options.sqlx_logging(false);

    Database::connect(options)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to database: {}", e)))
}
