//! Static file serving
//!
//! GET /static/{route}/{file} - Serve a file from a route's directory
//!
//! Paths under /static that name no file answer 404 instead of reaching the
//! web front-end.

use axum::{
    extract::{Path, Request, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::AppState;
use crate::registry::RegistryError;

/// Build the files router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/static/{route}/{*file}", get(serve_file))
        .route("/static", get(no_file))
        .route("/static/", get(no_file))
        .route("/static/{route}", get(no_file))
        .route("/static/{route}/", get(no_file))
}

async fn no_file() -> Response {
    RegistryError::NotFound.into_response()
}

/// Serve a file, resolving the route on every request
async fn serve_file(
    Path((route, file)): Path<(String, String)>,
    State(state): State<AppState>,
    request: Request,
) -> Response {
    let path = match state.registry.file_path(&route, &file).await {
        Ok(path) => path,
        Err(e) => return e.into_response(),
    };

    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
