//! 文本翻译 API
//!
//! `POST /api/translate`，请求体 `{"target": "en", "texts": ["..."]}`，
//! 返回 `{"data": ["..."]}`，译文与输入一一对应。

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Json, Response},
};

use super::{error_response, json_response};
use crate::translation::error::{helpers::log_error, TranslationError};
use crate::web::types::{AppState, ErrorResponse, TranslateTextsRequest, TranslateTextsResponse};

/// 翻译一组文本
pub async fn translate_texts(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TranslateTextsRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("无效的翻译请求体: {}", rejection);
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("Invalid JSON body").with_details(rejection.body_text()),
            );
        }
    };

    let texts = match request.texts {
        Some(texts) if !texts.is_empty() => texts,
        _ => {
            return error_response(StatusCode::BAD_REQUEST, ErrorResponse::new("Missing texts[]"));
        }
    };

    let target = match request.target.as_deref().map(str::trim) {
        Some(target) if !target.is_empty() => target.to_string(),
        _ => return error_response(StatusCode::BAD_REQUEST, ErrorResponse::new("Missing target")),
    };

    if texts.len() > state.max_api_texts {
        return error_response(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(format!(
                "Too many texts: at most {} per request",
                state.max_api_texts
            )),
        );
    }

    let Some(service) = state.translation_service() else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("Missing translation credential in environment"),
        );
    };

    match service.translate_texts(&texts, &target).await {
        Ok(data) => {
            tracing::info!("API 翻译完成: {} 条 -> {}", data.len(), target);
            json_response(StatusCode::OK, TranslateTextsResponse { data })
        }
        Err(TranslationError::MissingCredential) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("Missing translation credential in environment"),
        ),
        Err(e) => {
            log_error(&e);
            error_response(
                StatusCode::BAD_GATEWAY,
                ErrorResponse::new("Translation provider failed").with_details(e.to_string()),
            )
        }
    }
}

/// 非 POST 访问时明确返回 405
pub async fn translate_method_not_allowed() -> Response {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        ErrorResponse::new("Method Not Allowed. Use POST /api/translate"),
    )
}
