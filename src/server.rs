//! Server setup and configuration.

use std::any::Any;

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api;
use crate::error::ApiError;
use crate::health;
use crate::state::AppState;

/// Build the soil sample service router.
///
/// `/api/ml/predict` is mounted only when the state carries an inference engine.
pub fn build_router(state: AppState) -> Router {
    let mut router: Router<AppState> = Router::new()
        .route(
            "/api/soil-samples",
            get(api::list_samples).post(api::create_sample),
        )
        .route(
            "/api/soil-samples/{id}",
            get(api::get_sample)
                .patch(api::update_sample)
                .delete(api::delete_sample),
        );

    if state.has_inference() {
        router = router.route("/api/ml/predict", post(api::predict));
    }

    router
        .route("/health", get(health::health))
        .fallback(api::not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    ApiError::Internal(format!("handler panicked: {details}")).into_response()
}

/// Start the server on the given address.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let prediction = state.has_inference();
    let app = build_router(state);

    info!(addr = %addr, prediction, "Soil sample server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
