//! Test database setup
#![allow(dead_code)]

use sea_orm::{DatabaseConnection, DbErr};

/// Opens a fresh in-memory SQLite database with the schema applied.
///
/// It lives as long as its single pooled connection, so every test starts
/// from empty tables and tests can run in parallel.
pub async fn setup_test_database() -> Result<DatabaseConnection, DbErr> {
    let db = linkhub::db::connect("sqlite::memory:", 1).await?;
    linkhub::db::create_schema(&db).await?;
    Ok(db)
}
