//! Routes stored in the lookup table
//!
//! Schema:
//! - `routes(route, directory)`
//! - `route_flags(route, accepts_uploads)`; a route without a flags row
//!   does not accept uploads
//!
//! Every call queries the store, so edits to the table apply to the next
//! request.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use super::{Route, RouteError, RouteStore};
use crate::db::{Database, LookupPool};

const SQLITE_QUERY: &str = "SELECT routes.directory, COALESCE(route_flags.accepts_uploads, 0) \
     FROM routes LEFT JOIN route_flags ON route_flags.route = routes.route \
     WHERE routes.route = ?";

const POSTGRES_QUERY: &str = "SELECT routes.directory, COALESCE(route_flags.accepts_uploads, FALSE) \
     FROM routes LEFT JOIN route_flags ON route_flags.route = routes.route \
     WHERE routes.route = $1";

/// Route store backed by the lookup database
#[derive(Clone)]
pub struct LookupRouteStore {
    db: Arc<Database>,
}

impl LookupRouteStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn fetch(&self, name: &str) -> Result<Option<(String, bool)>, sqlx::Error> {
        match self.db.pool() {
            LookupPool::Sqlite(pool) => {
                let row: Option<(String, i64)> = sqlx::query_as(SQLITE_QUERY)
                    .bind(name)
                    .fetch_optional(pool)
                    .await?;
                Ok(row.map(|(directory, flag)| (directory, flag != 0)))
            }
            LookupPool::Postgres(pool) => {
                sqlx::query_as(POSTGRES_QUERY)
                    .bind(name)
                    .fetch_optional(pool)
                    .await
            }
        }
    }
}

#[async_trait]
impl RouteStore for LookupRouteStore {
    async fn resolve(&self, name: &str) -> Result<Option<Route>, RouteError> {
        debug!("Looking up route {:?}", name);

        let row = self.fetch(name).await.map_err(|e| {
            error!("Route store query for {:?} failed: {}", name, e);
            RouteError::StoreUnavailable(e)
        })?;

        Ok(row.map(|(directory, accepts_uploads)| Route {
            name: name.to_string(),
            directory: PathBuf::from(directory),
            accepts_uploads,
            all_random: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LookupSettings;
    use crate::db::test_utils::{insert_route, test_database};

    async fn store_with_routes() -> LookupRouteStore {
        let db = test_database().await;
        let LookupPool::Sqlite(pool) = db.pool() else {
            unreachable!()
        };
        insert_route(pool, "memes", "/srv/memes", Some(true)).await;
        insert_route(pool, "locked", "/srv/locked", Some(false)).await;
        insert_route(pool, "bare", "/srv/bare", None).await;
        LookupRouteStore::new(Arc::new(db))
    }

    #[tokio::test]
    async fn test_resolve_with_flags() {
        let store = store_with_routes().await;

        let route = store.resolve("memes").await.unwrap().unwrap();
        assert_eq!(route.name, "memes");
        assert_eq!(route.directory, PathBuf::from("/srv/memes"));
        assert!(route.accepts_uploads);
        assert!(!route.all_random);

        let route = store.resolve("locked").await.unwrap().unwrap();
        assert!(!route.accepts_uploads);
    }

    #[tokio::test]
    async fn test_route_without_flags_rejects_uploads() {
        let store = store_with_routes().await;

        let route = store.resolve("bare").await.unwrap().unwrap();
        assert_eq!(route.directory, PathBuf::from("/srv/bare"));
        assert!(!route.accepts_uploads);
    }

    #[tokio::test]
    async fn test_resolve_unknown_route() {
        let store = store_with_routes().await;
        assert_eq!(store.resolve("nonexistent-route").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolve_reads_fresh_rows() {
        let db = Arc::new(test_database().await);
        let store = LookupRouteStore::new(db.clone());
        assert_eq!(store.resolve("late").await.unwrap(), None);

        let LookupPool::Sqlite(pool) = db.pool() else {
            unreachable!()
        };
        insert_route(pool, "late", "/srv/late", None).await;

        assert!(store.resolve("late").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unreachable_store_is_an_error() {
        let settings = LookupSettings::Postgres {
            host: "127.0.0.1".into(),
            user: "gallery".into(),
            password: "secret".into(),
            database: "gallery".into(),
            port: 1,
        };
        let db = Database::connect(&settings).await.unwrap();
        let store = LookupRouteStore::new(Arc::new(db));

        let err = store.resolve("memes").await.unwrap_err();
        assert!(matches!(err, RouteError::StoreUnavailable(_)));
    }
}
