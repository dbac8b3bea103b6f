//! HTTP surface: `/generate`, `/overlay` and static files from the public root

use std::num::NonZeroU16;

use axum::extract::{State, rejection::JsonRejection};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::error::OverlayError;
use crate::overlay::{Compositor, OverlayRequest};
use crate::picker::{candidates_or_empty, choose_image_url};

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    compositor: Compositor,
}

impl AppState {
    fn new(compositor: Compositor) -> Self {
        Self { compositor }
    }
}

/// Body of both successful endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImageUrlResponse {
    image_url: String,
}

/// handles GET /generate, always 200
async fn generate_handler(State(state): State<AppState>) -> Json<ImageUrlResponse> {
    let candidates = candidates_or_empty(&state.compositor.paths().images).await;
    let image_url = choose_image_url(&candidates, &mut rand::rng());
    Json(ImageUrlResponse { image_url })
}

/// handles POST /overlay
async fn overlay_handler(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<ImageUrlResponse>, OverlayError> {
    let Json(body) =
        payload.map_err(|rejection| OverlayError::InvalidRequest(rejection.body_text()))?;
    let output = state
        .compositor
        .render(OverlayRequest::from_json(&body))
        .await?;
    info!("Rendered {:?} overlay to {}", output.outcome, output.url);
    Ok(Json(ImageUrlResponse {
        image_url: output.url,
    }))
}

fn create_router(state: AppState) -> Router {
    let public = ServeDir::new(&state.compositor.paths().root);
    Router::new()
        .route("/generate", get(generate_handler))
        .route("/overlay", post(overlay_handler))
        .fallback_service(public)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Binds the listener and serves until ctrl-c.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    compositor: Compositor,
) -> Result<(), anyhow::Error> {
    let app = create_router(AppState::new(compositor));

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}
