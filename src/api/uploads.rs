//! Upload form and upload endpoint
//!
//! GET  /upload/{route} - upload form, for routes that accept uploads
//! POST /upload/{route} - multipart upload of a single `file` field

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::debug;

use super::AppState;
use crate::registry::RegistryError;
use crate::uploads::{UploadRequest, UploadResult};

/// Multipart field carrying the file
const FILE_FIELD: &str = "file";

/// Build the uploads router
pub fn router(upload_limit: usize) -> Router<AppState> {
    Router::new().route(
        "/upload/{route}",
        get(upload_form)
            .post(upload_file)
            .layer(DefaultBodyLimit::max(upload_limit)),
    )
}

/// Upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub result: UploadResult,
    pub fullpath: String,
}

async fn upload_form(
    Path(route): Path<String>,
    State(state): State<AppState>,
) -> Result<Html<String>, RegistryError> {
    let route = state.registry.upload_route(&route).await?;
    Ok(Html(state.pages.upload(&route.name)?))
}

async fn upload_file(
    Path(route): Path<String>,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let route = match state.registry.upload_route(&route).await {
        Ok(route) => route,
        Err(e) => return e.into_response(),
    };

    // A body that is not multipart at all carries no file
    let upload = match multipart {
        Ok(multipart) => match read_upload(multipart).await {
            Ok(upload) => upload,
            Err(e) => {
                debug!("Rejected multipart body: {}", e);
                return (e.status(), e.body_text()).into_response();
            }
        },
        Err(rejection) => {
            debug!("Upload without multipart body: {}", rejection);
            None
        }
    };

    match state.registry.upload(&route, upload).await {
        Ok(result) => {
            let fullpath = format!("{}/{}", route.static_prefix(), result.stored_file_name);
            (StatusCode::OK, Json(UploadResponse { result, fullpath })).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// First non-empty file in the `file` field, if any
async fn read_upload(mut multipart: Multipart) -> Result<Option<UploadRequest>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let bytes = field.bytes().await?;
        return Ok(UploadRequest::new(file_name, bytes).ok());
    }
    Ok(None)
}
