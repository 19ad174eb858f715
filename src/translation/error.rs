//! 翻译模块统一错误处理
//!
//! 管道中的任何错误都不会变成面向用户的 5xx：网关拿到错误后一律回退到源站原文。

use std::fmt;

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 未配置翻译凭据
    #[error("未配置翻译凭据")]
    MissingCredential,

    /// 某一批次翻译失败（网络、状态码或结果数量不符）
    #[error("第 {batch_index} 批翻译失败: {reason}")]
    TranslationBatchFailed { batch_index: usize, reason: String },

    /// 文档无法解析或序列化
    #[error("文档格式错误: {0}")]
    MalformedDocument(String),

    /// 边缘缓存写入失败
    #[error("缓存写入失败: {0}")]
    CacheWriteFailed(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 翻译服务返回非成功状态或无法识别的响应
    #[error("翻译服务错误: {0}")]
    TranslationServiceError(String),

    /// 译文数量与请求数量不一致
    #[error("译文数量不匹配: 请求 {expected} 条，返回 {actual} 条")]
    ResultCountMismatch { expected: usize, actual: usize },

    /// 输入验证错误
    #[error("输入无效: {0}")]
    InvalidInput(String),
}

impl TranslationError {
    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::MissingCredential => ErrorSeverity::Warning,
            TranslationError::TranslationBatchFailed { .. } => ErrorSeverity::Error,
            TranslationError::MalformedDocument(_) => ErrorSeverity::Warning,
            TranslationError::CacheWriteFailed(_) => ErrorSeverity::Warning,
            TranslationError::NetworkError(_) => ErrorSeverity::Warning,
            TranslationError::TranslationServiceError(_) => ErrorSeverity::Error,
            TranslationError::ResultCountMismatch { .. } => ErrorSeverity::Error,
            TranslationError::InvalidInput(_) => ErrorSeverity::Info,
        }
    }

    /// 把客户端错误归并为带批次序号的批次失败
    pub fn into_batch_failure(self, batch_index: usize) -> Self {
        match self {
            TranslationError::TranslationBatchFailed { .. } => self,
            other => TranslationError::TranslationBatchFailed {
                batch_index,
                reason: other.to_string(),
            },
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            TranslationError::TranslationServiceError(format!("响应解析失败: {}", error))
        } else {
            TranslationError::NetworkError(error.to_string())
        }
    }
}

impl From<config::ConfigError> for TranslationError {
    fn from(error: config::ConfigError) -> Self {
        TranslationError::ConfigError(error.to_string())
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误（不返回）
    pub fn log_error(error: &TranslationError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误: {}", error),
        }
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::ConfigError(msg.to_string())
    }

    /// 创建输入验证错误
    pub fn validation_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::InvalidInput(msg.to_string())
    }
}
