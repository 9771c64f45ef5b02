mod db;

pub mod audit;
pub mod beneficiaries;
pub mod donations;
pub mod funds;
pub mod withdrawals;

use std::env;

pub use db::SqliteDatabase;
use log::info;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::traits::LedgerError;

const SQLITE_DB_URL: &str = "sqlite://data/cpg_store.db";

pub fn db_url() -> String {
    let result = env::var("CPG_DATABASE_URL").unwrap_or_else(|_| {
        info!("CPG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, LedgerError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
