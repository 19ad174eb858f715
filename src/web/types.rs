//! Web 模块的数据类型定义

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::gateway::Gateway;
use crate::translation::config::constants;
use crate::translation::core::service::ServiceStatsSnapshot;
use crate::translation::storage::CacheStats;
use crate::translation::TranslationService;

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    /// JSON 接口单次最多接受的文本条数
    pub max_api_texts: usize,
}

impl AppState {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            max_api_texts: constants::MAX_API_TEXTS,
        }
    }

    pub fn translation_service(&self) -> Option<&Arc<TranslationService>> {
        self.gateway.translation_service()
    }
}

/// 文本翻译请求
///
/// 字段都是可选的，缺失时由处理器返回 400 而不是反序列化错误。
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslateTextsRequest {
    pub target: Option<String>,
    pub texts: Option<Vec<String>>,
}

/// 文本翻译响应
#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateTextsResponse {
    pub data: Vec<String>,
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// 翻译服务名称；未配置凭据时为 `None`
    pub translator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_stats: Option<ServiceStatsSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
}
