//! Common test utilities - GalleryTest harness for end-to-end testing

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use galleryd::{Config, Server};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::json;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Test harness that spawns a real galleryd server on a random port
///
/// Layout under the temp root:
/// - `www/index.html` - front-end page
/// - `cats/` - `cat.png`, `clip.mp4`; all-random, accepts uploads
/// - `dogs/` - empty, all-random, no uploads
/// - `ghost/` - configured but never created, accepts uploads
/// - `memes/` - `meme.gif`; only reachable once added to the route store
/// - `secret.txt` - outside every route directory
/// - `routes.db` - SQLite route store
pub struct GalleryTest {
    pub addr: SocketAddr,
    pub client: Client,
    pub root: TempDir,
    server: Arc<Server>,
    pool: SqlitePool,
    _handle: JoinHandle<()>,
}

pub const INDEX_HTML: &str = "<html><body>gallery front page</body></html>";

impl GalleryTest {
    /// Start a new test server instance
    pub async fn start() -> Result<Self> {
        Self::start_with_upload_limit(None).await
    }

    /// Start a test server with an explicit upload size limit
    pub async fn start_with_upload_limit(limit: Option<usize>) -> Result<Self> {
        let root = TempDir::new()?;
        let dir = |name: &str| root.path().join(name);

        std::fs::create_dir(dir("www"))?;
        std::fs::write(dir("www").join("index.html"), INDEX_HTML)?;
        std::fs::create_dir(dir("cats"))?;
        std::fs::write(dir("cats").join("cat.png"), b"png bytes")?;
        std::fs::write(dir("cats").join("clip.mp4"), b"mp4 bytes")?;
        std::fs::create_dir(dir("dogs"))?;
        std::fs::create_dir(dir("memes"))?;
        std::fs::write(dir("memes").join("meme.gif"), b"gif bytes")?;
        std::fs::write(dir("secret.txt"), b"top secret")?;

        // Find a random available port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let mut config_json = json!({
            "webpageFolder": dir("www"),
            "websiteUrl": "https://gallery.example.com",
            "bindAddr": addr.to_string(),
            "imageFolders": [
                { "directory": dir("cats"), "route": "cats", "allRandom": true, "acceptsUploads": true },
                { "directory": dir("dogs"), "route": "dogs", "allRandom": true },
                { "directory": dir("ghost"), "route": "ghost", "acceptsUploads": true }
            ],
            "dbConnect": { "path": dir("routes.db") }
        });
        if let Some(limit) = limit {
            config_json["uploadLimitBytes"] = json!(limit);
        }
        let config = Config::from_json(&config_json.to_string())?;

        let server = Arc::new(Server::new(config).await?);
        let server_clone = server.clone();

        // Spawn the server in a background task
        let handle = tokio::spawn(async move {
            if let Err(e) = server_clone.run().await {
                eprintln!("Server error: {}", e);
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;

        // Poll until server is ready (max 2 seconds)
        let mut ready = false;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if client
                .get(format!("http://{}/health", addr))
                .send()
                .await
                .is_ok()
            {
                ready = true;
                break;
            }
        }

        if !ready {
            panic!("Server failed to start within 2 seconds");
        }

        // Separate connection to the route store for test setup
        let db_url = format!("sqlite:{}?mode=rwc", dir("routes.db").display());
        let pool = SqlitePool::connect(&db_url).await?;

        Ok(Self {
            addr,
            client,
            root,
            server,
            pool,
            _handle: handle,
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Path of a directory or file under the temp root
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Upload `bytes` as the `file` field of a multipart form
    pub async fn upload(
        &self,
        route: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<reqwest::Response> {
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        self.post_form(&format!("/upload/{}", route), form).await
    }

    /// POST a multipart form
    pub async fn post_form(&self, path: &str, form: Form) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .multipart(form)
            .send()
            .await?)
    }

    /// Add a route to the lookup store
    pub async fn add_store_route(
        &self,
        route: &str,
        directory: &Path,
        accepts_uploads: Option<bool>,
    ) -> Result<()> {
        sqlx::query("INSERT INTO routes (route, directory) VALUES (?, ?)")
            .bind(route)
            .bind(directory.to_string_lossy().as_ref())
            .execute(&self.pool)
            .await?;

        if let Some(accepts) = accepts_uploads {
            sqlx::query("INSERT INTO route_flags (route, accepts_uploads) VALUES (?, ?)")
                .bind(route)
                .bind(accepts)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    /// Shutdown the server gracefully
    pub fn shutdown(&self) {
        self.server.shutdown();
    }
}

impl Drop for GalleryTest {
    fn drop(&mut self) {
        self.server.shutdown();
    }
}
