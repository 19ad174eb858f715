//! 健康检查

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};

use super::json_response;
use crate::web::types::{AppState, HealthResponse};

pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let service = state.translation_service();

    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok".to_string(),
            translator: service.map(|service| service.provider_name().to_string()),
            translation_stats: service.map(|service| service.stats()),
            cache: state.gateway.cache_stats(),
        },
    )
}
