//! 存储模块
//!
//! 提供译文页面的边缘缓存。

pub mod cache;

pub use cache::{freshness_from_headers, CacheStats, CachedResponse, EdgeCache, MemoryEdgeCache};
