use crate::app::NormalizeUseCase;
use crate::error::BrandError;
use crate::observability::metrics;
use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Extension, Router,
};
use hyper::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "brand-normalizer",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Run a normalization pass and return the committed records
async fn normalize_brands(Extension(use_case): Extension<Arc<NormalizeUseCase>>) -> Response {
    match use_case.run().await {
        Ok(output) => Json(output.brands).into_response(),
        Err(e) => error_response(e),
    }
}

/// Normalize without writing; shows what a pass would commit
async fn preview_brands(Extension(use_case): Extension<Arc<NormalizeUseCase>>) -> Response {
    match use_case.preview().await {
        Ok(report) => Json(serde_json::json!({
            "read": report.read,
            "rejected": report.rejected,
            "fieldIssues": report.issues.len(),
            "brands": report.brands,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn prometheus_metrics() -> Response {
    match metrics::render() {
        Some(body) => body.into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

fn error_response(err: BrandError) -> Response {
    error!("Request failed: {}", err);
    let stage = match &err {
        BrandError::Replace(replace) => Some(replace.stage.as_str()),
        _ => None,
    };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": err.to_string(), "stage": stage })),
    )
        .into_response()
}

/// Create the HTTP router with all routes
pub fn create_server(use_case: Arc<NormalizeUseCase>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/brands", get(normalize_brands))
        .route("/brands/preview", get(preview_brands))
        .route("/metrics", get(prometheus_metrics))
        .layer(Extension(use_case))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port; returns after Ctrl-C
pub async fn start_server(
    use_case: Arc<NormalizeUseCase>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(use_case);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("HTTP server listening on http://{}", addr);

    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
