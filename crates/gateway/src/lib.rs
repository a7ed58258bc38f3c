//! HTTP gateway for Folio.
//!
//! Serves one assistant session over REST and Server-Sent Events so a
//! portfolio page can embed the chat widget.
//!
//! Built on Axum; the session lives behind a `tokio::sync::Mutex`, and a
//! second chat request while a turn is running is answered with `409`.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, response::Json, routing::get};
use folio_assistant::{AssistantSession, EventBus, LoadingTracker, ProfileDocument};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub session: Arc<Mutex<AssistantSession>>,
    /// Readable without the session lock
    pub events: EventBus,
    pub loading: Arc<LoadingTracker>,
    pub documents: Vec<ProfileDocument>,
}

impl GatewayState {
    pub fn new(session: AssistantSession) -> Self {
        Self {
            events: session.event_bus(),
            loading: session.loading_tracker(),
            documents: session.documents(),
            session: Arc::new(Mutex::new(session)),
        }
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api::api_router(state))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors_layer(allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// CORS: same-origin only unless origins are configured.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
pub async fn start(
    config: &folio_config::GatewayConfig,
    session: AssistantSession,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(GatewayState::new(session));
    let app = build_router(state, &config.allowed_origins);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
