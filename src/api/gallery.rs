//! Listing and random-pick endpoints
//!
//! GET /api/{route}    - JSON sample of a route's media
//! GET /random/{route} - page showing one random entry of a route
//! GET /random         - page showing one entry from all all-random routes

use axum::{
    extract::{Path, State},
    response::Html,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::AppState;
use crate::gallery::MediaEntry;
use crate::registry::RegistryError;

/// Build the gallery router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/{route}", get(list_media))
        .route("/random", get(random_all))
        .route("/random/{route}", get(random_page))
}

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub data: Vec<MediaEntry>,
}

async fn list_media(
    Path(route): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ListingResponse>, RegistryError> {
    let data = state.registry.sample(&route).await?;
    Ok(Json(ListingResponse { data }))
}

async fn random_page(
    Path(route): Path<String>,
    State(state): State<AppState>,
) -> Result<Html<String>, RegistryError> {
    let entry = state.registry.random_one(&route).await?;
    Ok(Html(state.pages.random(&route, &entry)?))
}

async fn random_all(State(state): State<AppState>) -> Result<Html<String>, RegistryError> {
    let entry = state.registry.random_from_all().await?;
    Ok(Html(state.pages.random("random", &entry)?))
}
