//! HTTP API Server for rankings
//!
//! REST endpoints over the ranking service. Requests are only served once the
//! initial model build has completed; the router is built around a loaded
//! [`Recommender`].

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::service::{Overview, Recommender, SnapshotStats};
use crate::store::ProductInfo;

/// Shared application state
pub struct AppState {
    pub recommender: Recommender,
}

/// Query params for ranking endpoints
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Response for a user's personalized ranking
#[derive(Debug, Serialize, Deserialize)]
pub struct UserRankingResponse {
    pub user_id: String,
    pub items: Vec<String>,
    pub total: usize,
}

/// Response for the global ranking
#[derive(Debug, Serialize, Deserialize)]
pub struct TopProductsResponse {
    pub items: Vec<String>,
    pub total: usize,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Build the API router
pub fn router(state: Arc<AppState>, config: &ApiConfig) -> Router {
    let app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Rankings
        .route("/api/v1/rankings/:user_id", get(get_user_ranking))
        .route("/api/v1/top-products", get(get_top_products))
        .route("/api/v1/overview", get(get_overview))
        // Catalogue lookup
        .route("/api/v1/products/:product_id", get(get_product))
        // Model administration
        .route("/api/v1/stats", get(get_stats))
        .route("/api/v1/reload", post(reload_model))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app.layer(cors)
    } else {
        app
    }
}

/// Start the API server, stopping when `shutdown` resolves
pub async fn start_server(
    state: Arc<AppState>,
    config: &ApiConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = router(state, config);

    let addr = format!("{}:{}", config.host, config.port);
    info!("🚀 Starting ranking API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get a user's personalized ranking
async fn get_user_ranking(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<UserRankingResponse>> {
    let config = state.recommender.ranking_config();
    let limit = resolve_limit(query.limit, config.default_top_n, config.max_limit)?;

    let items = state
        .recommender
        .get_personalized_ranking(&user_id, limit)
        .await?;

    Ok(Json(UserRankingResponse {
        user_id,
        total: items.len(),
        items,
    }))
}

/// Get the global top products
async fn get_top_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<TopProductsResponse>> {
    let config = state.recommender.ranking_config();
    let limit = resolve_limit(query.limit, config.global_top_k, config.max_limit)?;

    let items = state.recommender.get_global_top_products(limit).await?;

    Ok(Json(TopProductsResponse {
        total: items.len(),
        items,
    }))
}

/// Rankings for the first few users plus the global list, with display metadata
async fn get_overview(State(state): State<Arc<AppState>>) -> Result<Json<Overview>> {
    Ok(Json(state.recommender.overview().await?))
}

/// Display metadata for a product
async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<Json<ProductInfo>> {
    state
        .recommender
        .product_info(&product_id)
        .await
        .map(Json)
        .ok_or_else(|| Error::not_found("product", product_id))
}

/// Shape of the active model
async fn get_stats(State(state): State<Arc<AppState>>) -> Json<SnapshotStats> {
    Json(state.recommender.stats().await)
}

/// Rebuild the model from the data file
async fn reload_model(State(state): State<Arc<AppState>>) -> Result<Json<SnapshotStats>> {
    Ok(Json(state.recommender.reload().await?))
}

fn resolve_limit(requested: Option<usize>, default: usize, max: usize) -> Result<usize> {
    match requested {
        None => Ok(default),
        Some(limit) if (1..=max).contains(&limit) => Ok(limit),
        Some(limit) => Err(Error::bad_request(format!(
            "limit must be between 1 and {}, got {}",
            max, limit
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_limit() {
        assert_eq!(resolve_limit(None, 5, 100).unwrap(), 5);
        assert_eq!(resolve_limit(Some(20), 5, 100).unwrap(), 20);
        assert!(resolve_limit(Some(0), 5, 100).is_err());
        assert!(matches!(
            resolve_limit(Some(101), 5, 100),
            Err(Error::BadRequest { .. })
        ));
    }
}
