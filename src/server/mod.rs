mod api;
mod error;
mod state;
mod types;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;

pub use self::state::*;

/// 构建API服务器
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/create_collection", post(api::create_collection_handler))
        .route("/add_image", post(api::add_image_handler))
        .route("/find_similar", post(api::find_similar_handler))
        .route("/collections", get(api::collections_handler))
        .route("/metrics", get(api::metrics_handler))
        .layer(DefaultBodyLimit::disable())
        // 上传限制：10M
        .layer(RequestBodyLimitLayer::new(1024 * 1024 * 10))
        .with_state(state)
}
