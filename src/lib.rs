//! # Edge Translator
//!
//! 请求时翻译 HTML 的反向代理：按目标语言抓取源站页面，翻译可见文本，
//! 把结果写入边缘缓存后返回。
//!
//! ## 模块组织
//!
//! - `env` - 类型安全的环境变量
//! - `parsers` - HTML 解析、节点操作与序列化
//! - `network` - 源站访问
//! - `translation` - 翻译管道、翻译服务与边缘缓存
//! - `gateway` - 请求状态机（语言解析、缓存键、失败回退）
//! - `web` - axum 服务器（需要 `server` feature）

pub mod env;
pub mod gateway;
pub mod network;
pub mod parsers;
pub mod translation;
#[cfg(feature = "server")]
pub mod web;

pub use gateway::{Gateway, GatewayOutcome, GatewayResponse};
pub use network::{HttpOrigin, Origin, ProxyRequest, ProxyResponse};
