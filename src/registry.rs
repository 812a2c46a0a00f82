//! Route registry - per-route gallery operations
//!
//! Resolves a route name through the configured stores (static routes
//! first, then the lookup store) and runs the listing, random pick, upload
//! or file lookup for it. Every failure is returned as a `RegistryError`;
//! turning those into HTTP responses is the API layer's job.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::gallery::{self, GalleryError, MediaEntry, SampleMode};
use crate::routes::{Route, RouteError, RouteStore, StaticRouteStore};
use crate::uploads::{self, UploadError, UploadRequest, UploadResult};

/// Errors surfaced by registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("route not found")]
    NotFound,

    #[error("invalid file path")]
    InvalidPath,

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Gallery(#[from] GalleryError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("failed to render page: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Listing behaviour shared by all routes
#[derive(Debug, Clone, Copy)]
pub struct ListingOptions {
    pub sample_size: usize,
    pub sample_mode: SampleMode,
}

/// Composes route stores with listing and upload storage
pub struct RouteRegistry {
    static_routes: Arc<StaticRouteStore>,
    stores: Vec<Arc<dyn RouteStore>>,
    listing: ListingOptions,
}

impl RouteRegistry {
    /// Create a registry over configured routes and an optional lookup store
    pub fn new(
        static_routes: StaticRouteStore,
        lookup: Option<Arc<dyn RouteStore>>,
        listing: ListingOptions,
    ) -> Self {
        let static_routes = Arc::new(static_routes);
        let mut stores: Vec<Arc<dyn RouteStore>> = Vec::new();
        stores.push(static_routes.clone());
        stores.extend(lookup);

        Self {
            static_routes,
            stores,
            listing,
        }
    }

    /// Resolve a route name, trying each store in order
    pub async fn resolve(&self, name: &str) -> Result<Option<Route>, RouteError> {
        for store in &self.stores {
            if let Some(route) = store.resolve(name).await? {
                return Ok(Some(route));
            }
        }
        Ok(None)
    }

    async fn require(&self, name: &str) -> Result<Route, RegistryError> {
        self.resolve(name).await?.ok_or_else(|| {
            debug!("Unknown route {:?}", name);
            RegistryError::NotFound
        })
    }

    /// Sampled listing for the listing API
    pub async fn sample(&self, name: &str) -> Result<Vec<MediaEntry>, RegistryError> {
        let route = self.require(name).await?;
        let entries = gallery::sample(
            &route.directory,
            &route.static_prefix(),
            self.listing.sample_size,
            self.listing.sample_mode,
        )
        .await?;
        Ok(entries)
    }

    /// One random entry from a route
    pub async fn random_one(&self, name: &str) -> Result<MediaEntry, RegistryError> {
        let route = self.require(name).await?;
        Ok(gallery::random_one(&route.directory, &route.static_prefix()).await?)
    }

    /// One random entry from the union of every all-random route
    pub async fn random_from_all(&self) -> Result<MediaEntry, RegistryError> {
        let mut pool = Vec::new();
        for route in self.static_routes.all_random() {
            pool.extend(gallery::entries(&route.directory, &route.static_prefix()).await?);
        }
        Ok(gallery::pick_one(&pool)?)
    }

    /// Route that accepts uploads, or NotFound
    pub async fn upload_route(&self, name: &str) -> Result<Route, RegistryError> {
        let route = self.require(name).await?;
        if !route.accepts_uploads {
            debug!("Route {:?} does not accept uploads", name);
            return Err(RegistryError::NotFound);
        }
        Ok(route)
    }

    /// Store an upload in the directory of a route returned by `upload_route`
    pub async fn upload(
        &self,
        route: &Route,
        upload: Option<UploadRequest>,
    ) -> Result<UploadResult, RegistryError> {
        if !route.accepts_uploads {
            return Err(RegistryError::NotFound);
        }
        let upload = upload.ok_or(UploadError::MissingPayload)?;
        Ok(uploads::store(&route.directory, &upload).await?)
    }

    /// Filesystem path of a file served under a route
    ///
    /// `file` must be a single plain path component; anything that could
    /// step outside the route directory is rejected.
    pub async fn file_path(&self, name: &str, file: &str) -> Result<PathBuf, RegistryError> {
        let route = self.require(name).await?;
        let file = contained_file_name(file).ok_or(RegistryError::InvalidPath)?;
        Ok(route.directory.join(file))
    }
}

/// `file` if it names an entry directly inside a directory
pub fn contained_file_name(file: &str) -> Option<&str> {
    if file.is_empty() || file.contains(['\\', '\0']) {
        return None;
    }

    let mut components = Path::new(file).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Some(file),
        _ => None,
    }
}
