//! # 网络模块
//!
//! - `origin` - 源站请求转发与响应读取

pub mod origin;

pub use origin::{strip_hop_by_hop, HttpOrigin, Origin, OriginError, ProxyRequest, ProxyResponse};
