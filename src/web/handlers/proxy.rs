//! 反向代理处理器
//!
//! 除 API 之外的所有请求都交给网关：决定透传、命中缓存或翻译。

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, FromRequest, Request, State},
    response::Response,
};

use crate::gateway::GatewayResponse;
use crate::network::origin::{ProxyRequest, ProxyResponse};
use crate::web::handlers::api::error_response;
use crate::web::types::{AppState, ErrorResponse};

/// 请求体上限，由路由上的 `DefaultBodyLimit` 生效
pub const MAX_REQUEST_BODY_BYTES: usize = 10 * 1024 * 1024;

/// 代理入口
pub async fn proxy_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let proxy_request = match into_proxy_request(request).await {
        Ok(request) => request,
        Err(rejection) => {
            let status = rejection.status();
            tracing::warn!("读取请求体失败: {} ({})", rejection.body_text(), status);
            return error_response(
                status,
                ErrorResponse::new("Request body could not be read")
                    .with_details(rejection.body_text()),
            );
        }
    };

    let GatewayResponse { response, .. } = state.gateway.handle(proxy_request).await;
    into_response(response)
}

/// axum 请求转为网关请求
///
/// 超过长度上限时拒绝状态为 413，其余读取失败为 400。
pub async fn into_proxy_request(request: Request) -> Result<ProxyRequest, BytesRejection> {
    let method = request.method().clone();
    let headers = request.headers().clone();
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let body = Bytes::from_request(request, &()).await?;

    Ok(ProxyRequest {
        method,
        path_and_query,
        headers,
        body: body.to_vec(),
    })
}

/// 网关响应转为 axum 响应
pub fn into_response(response: ProxyResponse) -> Response {
    let mut out = Response::new(Body::from(response.body));
    *out.status_mut() = response.status;
    *out.headers_mut() = response.headers;
    out
}
