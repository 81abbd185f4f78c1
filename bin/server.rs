// GoFinances - Web Server
// Serves the same formatted dashboard the terminal UI renders, as JSON

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use gofinances::{
    load_transactions, logging, AppConfig, DashboardError, DashboardLoader, SqliteStorage,
    Storage,
};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
struct AppState {
    storage: Arc<dyn Storage>,
    loader: Arc<DashboardLoader>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        let body = Self {
            success: true,
            data: Some(data),
            error: None,
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

fn failure(context: &str, err: DashboardError) -> Response {
    error!(error = %err, "{}", context);

    let status = if err.is_data_error() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let body = ApiResponse::<()> {
        success: false,
        data: None,
        error: Some(err.to_string()),
    };
    (status, Json(body)).into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Response {
    ApiResponse::ok("OK")
}

/// GET /api/users/:user_id/dashboard - Cards and formatted list
async fn get_dashboard(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    match state.loader.load(&user_id) {
        Ok(dashboard) => ApiResponse::ok(dashboard),
        Err(e) => failure("Error loading dashboard", e),
    }
}

/// GET /api/users/:user_id/transactions - Stored transactions, unformatted
async fn get_transactions(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    match load_transactions(state.storage.as_ref(), &user_id) {
        Ok(transactions) => ApiResponse::ok(transactions),
        Err(e) => failure("Error loading transactions", e),
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_stderr();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let storage: Arc<dyn Storage> = Arc::new(
        SqliteStorage::open(&config.database_path)
            .with_context(|| format!("Failed to open {}", config.database_path.display()))?,
    );
    let loader = Arc::new(DashboardLoader::new(storage.clone(), config.display_options()));

    let state = AppState { storage, loader };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/users/:user_id/dashboard", get(get_dashboard))
        .route("/users/:user_id/transactions", get(get_transactions))
        .with_state(state);

    // Build main router
    let app = Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, "server running");

    axum::serve(listener, app)
        .await
        .context("Server terminated")?;

    Ok(())
}
