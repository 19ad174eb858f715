//! Web 路由定义

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::web::{handlers::*, types::AppState};

/// 创建路由：API 带 CORS，其余路径全部交给代理
pub fn create_routes() -> Router<Arc<AppState>> {
    let api = Router::new()
        .route(
            "/api/translate",
            post(translate_texts).fallback(translate_method_not_allowed),
        )
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/healthz", get(health_check))
        .merge(api)
        .fallback(proxy_handler)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
}
