//! API处理器模块

pub mod health;
pub mod translation;

pub use health::*;
pub use translation::*;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::web::types::ErrorResponse;

/// JSON 响应，一律禁止缓存
pub fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

pub fn error_response(status: StatusCode, error: ErrorResponse) -> Response {
    json_response(status, error)
}
