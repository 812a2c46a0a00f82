//! Shared test utilities for route store tests
//!
//! Provides an in-memory lookup store with the full schema and a helper
//! to seed routes.

use sqlx::SqlitePool;

use super::Database;

/// Create an in-memory test database with full schema
pub async fn test_database() -> Database {
    Database::new(None)
        .await
        .expect("Failed to create test database")
}

/// Insert a route row, plus a flags row when `accepts_uploads` is given
pub async fn insert_route(
    pool: &SqlitePool,
    route: &str,
    directory: &str,
    accepts_uploads: Option<bool>,
) {
    sqlx::query("INSERT INTO routes (route, directory) VALUES (?, ?)")
        .bind(route)
        .bind(directory)
        .execute(pool)
        .await
        .expect("Failed to insert route");

    if let Some(accepts) = accepts_uploads {
        sqlx::query("INSERT INTO route_flags (route, accepts_uploads) VALUES (?, ?)")
            .bind(route)
            .bind(accepts)
            .execute(pool)
            .await
            .expect("Failed to insert route flags");
    }
}
