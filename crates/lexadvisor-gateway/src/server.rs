//! HTTP server implementation using Axum.

use axum::{
    Router,
    routing::{delete, get, post},
};
use lexadvisor_core::config::GatewayConfig;
use lexadvisor_knowledge::LegalAdvisor;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub gateway_config: GatewayConfig,
    pub start_time: std::time::Instant,
    /// Retrieval, grounding, generation and the article write path.
    pub advisor: Arc<LegalAdvisor>,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.gateway_config.cors_origins);
    let shared = Arc::new(state);

    Router::new()
        .route("/health", get(super::routes::health_check))
        .route("/api/search", post(super::routes::search))
        .route(
            "/api/admin/articles",
            get(super::routes::list_articles).post(super::routes::upsert_article),
        )
        .route(
            "/api/admin/articles/{article_num}",
            delete(super::routes::delete_article),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// CORS for the configured origins; no origins configured allows any.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    let parsed: Vec<_> = origins
        .iter()
        .filter_map(|s| match s.trim().parse::<axum::http::HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("⚠️ Ignoring invalid CORS origin: {s}");
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(parsed)
    }
}

/// Start the HTTP server.
pub async fn start(config: &GatewayConfig, advisor: Arc<LegalAdvisor>) -> anyhow::Result<()> {
    tracing::info!(
        "🧠 Advisor ready (encoder={}, generator={})",
        advisor.encoder_name(),
        advisor.generator_name()
    );

    let state = AppState {
        gateway_config: config.clone(),
        start_time: std::time::Instant::now(),
        advisor,
    };
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Gateway server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
