//! 翻译系统核心模块
//!
//! - `client`: 翻译服务抽象与 Google Translate 客户端
//! - `service`: 文档翻译流程编排
//!
//! ```text
//! TranslationService (service.rs)
//!     ├── TextCollector  (pipeline/collector.rs)
//!     ├── BatchPlan      (pipeline/batch.rs)
//!     ├── Translator     (client.rs)
//!     └── rewrite_document (pipeline/rewriter.rs)
//! ```

pub mod client;
pub mod service;

pub use client::{GoogleTranslateClient, Translator};
pub use service::{ServiceStats, ServiceStatsSnapshot, TranslatedDocument, TranslationService};
