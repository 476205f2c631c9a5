//! HTTP handlers for uploading and downloading files.

use axum::Json;
use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use filedrop_core::{DEFAULT_CONTENT_TYPE, Digest, Error as StorageError};
use serde::Serialize;
use tokio::fs::File;
use tokio::task::JoinError;
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};

use crate::server::AppState;

/// Prefix of download URLs handed back to uploaders.
pub const DOWNLOAD_PREFIX: &str = "/api/file/";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub download_url: String,
    pub size: u64,
    pub blake3: Digest,
}

/// `POST /api/file` with multipart fields `password` and `file`.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut password = None;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("password") => password = Some(field.text().await?),
            Some("file") => {
                let original_name = field.file_name().unwrap_or_default().to_owned();
                let data = field.bytes().await?;
                upload = Some((original_name, data));
            }
            _ => {}
        }
    }

    if !state.config.accepts(password.as_deref()) {
        warn!("upload rejected: bad credential");
        return Err(ApiError::Unauthorized);
    }

    let Some((original_name, data)) = upload else {
        return Err(ApiError::BadRequest("No file uploaded"));
    };

    let storage = state.storage.clone();
    let stored =
        tokio::task::spawn_blocking(move || storage.store(&original_name, &data)).await??;

    info!(name = %stored.name, size = stored.size, "file uploaded");

    Ok(Json(UploadResponse {
        success: true,
        download_url: format!("{}{}", DOWNLOAD_PREFIX, stored.name),
        filename: stored.name.into_string(),
        size: stored.size,
        blake3: stored.digest,
    }))
}

/// `GET /api/file/{name}`: stream a stored file inline.
pub async fn download_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let storage = state.storage.clone();
    let resolved = tokio::task::spawn_blocking(move || storage.retrieve(&name)).await??;

    let file = match File::open(&resolved.path).await {
        Ok(file) => file,
        // Removed after resolution
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(ApiError::NotFound),
        Err(e) => {
            error!(path = %resolved.path.display(), error = %e, "failed to open stored file");
            return Err(ApiError::Internal("Error retrieving file"));
        }
    };

    let content_type = HeaderValue::from_str(&resolved.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CONTENT_DISPOSITION, HeaderValue::from_static("inline"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(resolved.size));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    Ok((
        StatusCode::OK,
        headers,
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

/// `GET /api/file` or `/api/file/` with no name.
pub async fn missing_name() -> ApiError {
    ApiError::BadRequest("No filename provided")
}

/// Error responses. Messages are fixed strings; storage and OS detail only
/// goes to the log.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str),
    Unauthorized,
    Forbidden,
    NotFound,
    PayloadTooLarge,
    Internal(&'static str),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, *msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Access denied"),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "File not found"),
            ApiError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "Upload too large"),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, *msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_message();
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidRequest { .. } => ApiError::BadRequest("Invalid filename"),
            StorageError::PathTraversal { .. } => ApiError::Forbidden,
            StorageError::NotFound { .. } => ApiError::NotFound,
            StorageError::Write { .. } => {
                error!(error = %err, "failed to store upload");
                ApiError::Internal("Error uploading file")
            }
            StorageError::InvalidRoot { .. } | StorageError::Io { .. } => {
                error!(error = %err, "storage failure");
                ApiError::Internal("Error retrieving file")
            }
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        warn!(error = %err, "malformed upload");
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest("Malformed upload")
        }
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        error!(error = %err, "storage task failed");
        ApiError::Internal("Internal error")
    }
}
