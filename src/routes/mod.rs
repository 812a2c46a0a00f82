//! Route resolution
//!
//! A route maps a URL segment to a media directory and its upload policy.
//! Routes come either from the configuration file (resolved once at
//! startup) or from the lookup store (resolved per request).

mod lookup;
mod static_store;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

pub use lookup::LookupRouteStore;
pub use static_store::StaticRouteStore;

/// URL prefix under which route files are served
pub const STATIC_PREFIX: &str = "/static";

/// Route resolution errors
///
/// An unknown route is not an error; `resolve` returns `Ok(None)`.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),
}

/// A named media directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    pub directory: PathBuf,
    pub accepts_uploads: bool,
    pub all_random: bool,
}

impl Route {
    /// Public URL prefix for this route's files
    pub fn static_prefix(&self) -> String {
        format!("{}/{}", STATIC_PREFIX, self.name)
    }
}

/// A source of routes
#[async_trait]
pub trait RouteStore: Send + Sync {
    /// Look up a route by name
    async fn resolve(&self, name: &str) -> Result<Option<Route>, RouteError>;
}
