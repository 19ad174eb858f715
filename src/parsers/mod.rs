//! # 解析器模块
//!
//! 负责 HTML 文档的解析、节点操作与序列化。翻译管道只通过这里接触 DOM。

pub mod html;

pub use html::{html_to_dom, serialize_document};
