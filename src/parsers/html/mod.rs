//! HTML解析和处理模块
//!
//! - `utils`: Content-Type / charset 工具函数
//! - `dom`: DOM 解析与基础节点操作
//! - `serializer`: 序列化功能

pub mod dom;
pub mod serializer;
pub mod utils;

pub use dom::{
    get_document_element, get_node_attr, get_node_name, has_node_attr,
    html_to_dom, node_has_class, set_node_attr, set_text_content,
};
pub use serializer::serialize_document;
pub use utils::{charset_from_content_type, is_html_content_type, HTML_MIME_TYPES};
