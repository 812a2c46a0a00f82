//! HTTP API module - gallery routes, uploads and the web front-end

mod files;
mod gallery;
mod uploads;

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::db::Database;
use crate::gallery::GalleryError;
use crate::pages::Pages;
use crate::registry::{RegistryError, RouteRegistry};
use crate::routes::RouteError;
use crate::uploads::UploadError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RouteRegistry>,
    pub pages: Arc<Pages>,
    pub db: Option<Arc<Database>>,
}

/// Build the API router
///
/// Requests no gallery route claims are served from `webpage_folder`,
/// with `index.html` as the fallback page.
pub fn router(state: AppState, webpage_folder: &Path, upload_limit: usize) -> Router {
    let webpage = ServeDir::new(webpage_folder)
        .fallback(ServeFile::new(webpage_folder.join("index.html")));

    Router::new()
        .route("/health", get(health_check))
        .merge(gallery::router())
        .merge(files::router())
        .merge(uploads::router(upload_limit))
        .fallback_service(webpage)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        match &self {
            RegistryError::NotFound
            | RegistryError::InvalidPath
            | RegistryError::Gallery(GalleryError::EmptyDirectory) => {
                error_response(StatusCode::NOT_FOUND, "not found")
            }
            RegistryError::Upload(UploadError::MissingPayload) => {
                error_response(StatusCode::BAD_REQUEST, "no file uploaded")
            }
            RegistryError::Upload(UploadError::WriteFailed { .. }) => {
                error!("Upload failed: {}", self);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "upload failed")
            }
            RegistryError::Route(RouteError::StoreUnavailable(_)) => {
                error!("{}", self);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "route store unavailable",
                )
            }
            RegistryError::Gallery(GalleryError::ListFailed { .. }) => {
                error!("{}", self);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to list media")
            }
            RegistryError::Render(_) => {
                error!("{}", self);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to render page")
            }
        }
    }
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let Some(db) = &state.db else {
        return (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                route_store: "disabled",
            }),
        );
    };

    match db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                route_store: "ok",
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy",
                route_store: "error",
            }),
        ),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    route_store: &'static str,
}
