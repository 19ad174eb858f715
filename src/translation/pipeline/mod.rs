//! 翻译管道模块
//!
//! 过滤 → 收集 → 去重分批 → 回写。翻译调用本身在 `core` 模块。

pub mod batch;
pub mod collector;
pub mod filters;
pub mod rewriter;

// 重新导出主要类型
pub use batch::{Batch, BatchPlan};
pub use collector::{split_whitespace, CollectedTexts, CollectionStats, TextCollector, TextItem};
pub use filters::{Eligibility, SkipReason, TextFilter};
pub use rewriter::{apply_translations, rewrite_document, set_document_language, RewriteStats};
