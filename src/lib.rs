//! galleryd - image gallery server daemon
//!
//! Serves media directories as galleries with random sampling and
//! content-addressed uploads.

pub mod api;
pub mod config;
pub mod db;
pub mod gallery;
pub mod media;
pub mod pages;
pub mod registry;
pub mod routes;
pub mod uploads;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

pub use config::Config;
use db::Database;
use pages::Pages;
use registry::{ListingOptions, RouteRegistry};
use routes::{LookupRouteStore, RouteStore, StaticRouteStore};

/// The galleryd server instance
pub struct Server {
    config: Config,
    state: api::AppState,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a new server instance
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let db = match config.lookup_settings()? {
            Some(settings) => Some(Arc::new(Database::connect(&settings).await?)),
            None => None,
        };
        let lookup = db
            .clone()
            .map(|db| Arc::new(LookupRouteStore::new(db)) as Arc<dyn RouteStore>);

        let static_routes = StaticRouteStore::new(&config.image_folders);
        info!("Loaded {} configured routes", static_routes.len());

        let registry = RouteRegistry::new(
            static_routes,
            lookup,
            ListingOptions {
                sample_size: config.sample_size,
                sample_mode: config.sample_mode,
            },
        );
        let pages = Pages::new(&config.website_url)?;

        let state = api::AppState {
            registry: Arc::new(registry),
            pages: Arc::new(pages),
            db,
        };
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            state,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Get the lookup store handle, if one is configured
    pub fn db(&self) -> Option<Arc<Database>> {
        self.state.db.clone()
    }

    /// Build the router
    fn router(&self) -> Router {
        api::router(
            self.state.clone(),
            &self.config.webpage_folder,
            self.config.upload_limit_bytes,
        )
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("galleryd listening on {}", local_addr);

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("galleryd shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
