//! Error handling

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use tracing::info;

/// Message returned when the request carries no image reference.
pub const MISSING_IMAGE_URL: &str = "imageUrl is required";

/// Message returned when the image reference escapes the public root.
pub const INVALID_IMAGE_PATH: &str = "Invalid image path";

/// Message returned when neither the render nor the fallback copy worked.
pub const RENDER_FAILED: &str = "Failed to render or copy image";

/// Errors surfaced by the overlay pipeline.
#[derive(Debug)]
pub enum OverlayError {
    /// The client sent something we can't act on, the message goes back as-is.
    InvalidRequest(String),
    /// Every render path failed, the cause is logged but not returned.
    RenderFailure(String),
}

impl OverlayError {
    /// Shorthand for a missing or empty `imageUrl`.
    pub fn missing_image_url() -> Self {
        Self::InvalidRequest(MISSING_IMAGE_URL.to_string())
    }

    /// Shorthand for an `imageUrl` outside the public root.
    pub fn invalid_image_path() -> Self {
        Self::InvalidRequest(INVALID_IMAGE_PATH.to_string())
    }
}

impl std::fmt::Display for OverlayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest(message) => write!(f, "Invalid request: {message}"),
            Self::RenderFailure(cause) => write!(f, "Render failure: {cause}"),
        }
    }
}

impl std::error::Error for OverlayError {}

impl From<tokio::task::JoinError> for OverlayError {
    fn from(err: tokio::task::JoinError) -> Self {
        OverlayError::RenderFailure(err.to_string())
    }
}

/// JSON body for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}

impl IntoResponse for OverlayError {
    fn into_response(self) -> axum::response::Response {
        match self {
            OverlayError::InvalidRequest(message) => {
                info!("Bad request received: {}", message);
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })).into_response()
            }
            OverlayError::RenderFailure(cause) => {
                tracing::error!("Render failure: {}", cause);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: RENDER_FAILED.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
