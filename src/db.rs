use sea_orm::{ConnectOptions, Database as SeaDatabase, DatabaseConnection};
use std::time::Duration;

use crate::config::Config;

/// Initialize the database connection pool from config.
///
/// One pooled connection is acquired per request and released on every exit
/// path; the pool is the only shared database state in the process.
pub async fn connect(config: &Config) -> Result<DatabaseConnection, sea_orm::DbErr> {
    let mut opts = ConnectOptions::new(&config.database_url);

    // In-memory SQLite exists per connection; a single-connection pool is
    // the only way every session sees the same database.
    if config.database_url.starts_with("sqlite::memory:") {
        opts.max_connections(1).min_connections(1);
    } else {
        opts.max_connections(50).min_connections(5);
    }

    opts.connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .sqlx_logging(config.is_dev());

    SeaDatabase::connect(opts).await
}
