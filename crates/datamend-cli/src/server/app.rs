//! Axum application setup.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use super::state::AppState;

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Dataset
        .route("/upload", post(handlers::upload))
        .route("/get_columns", get(handlers::get_columns))
        .route("/download", get(handlers::download))
        // Detection
        .route(
            "/missing_datetime_intervals",
            get(handlers::missing_datetime_intervals),
        )
        .route(
            "/missing_value_intervals",
            get(handlers::missing_value_intervals_query).post(handlers::missing_value_intervals),
        )
        // Treatment
        .route("/apply_treatment", post(handlers::apply_treatment))
        .route(
            "/apply_missing_value_treatment",
            post(handlers::apply_missing_value_treatment),
        )
        // Prompts
        .route("/chat", post(handlers::chat))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the web server.
pub async fn run_server(state: AppState, host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;

    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutting down");
        })
        .await?;

    Ok(())
}
