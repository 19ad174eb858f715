//! Web 请求处理器模块
//!
//! - `api` - JSON 接口（文本翻译、健康检查）
//! - `proxy` - 反向代理入口

pub mod api;
pub mod proxy;

pub use api::*;
pub use proxy::*;
