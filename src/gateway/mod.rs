//! # 请求网关
//!
//! 决定一个请求是否需要翻译，协调边缘缓存、源站与翻译流程。
//!
//! - `language` - 目标语言解析（查询参数 / 路径前缀）
//! - `cache_key` - 规范缓存键
//! - `coordinator` - 请求状态机

pub mod cache_key;
pub mod coordinator;
pub mod language;

pub use cache_key::canonical_cache_key;
pub use coordinator::{
    wants_html, Gateway, GatewayOutcome, GatewayResponse, PassReason, UnmodifiedReason,
};
pub use language::{LanguageResolver, LanguageSelection};
