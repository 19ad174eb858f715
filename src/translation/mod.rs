//! 翻译模块
//!
//! - **pipeline**: 文本过滤、收集、去重分批与回写
//! - **core**: 翻译客户端与流程编排
//! - **storage**: 边缘缓存
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! ```rust,no_run
//! use edge_translator::translation::{ConfigManager, TranslationService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigManager::load(None)?.into_config();
//! let service = TranslationService::from_config(&config)?;
//!
//! let html = b"<p>Hello <b>world</b></p>";
//! let translated = service.translate_document(html, "utf-8", "en").await?;
//! println!("{}", String::from_utf8_lossy(&translated.body));
//! # Ok(())
//! # }
//! ```

/// 配置管理模块
pub mod config;

/// 翻译客户端与服务
pub mod core;

/// 错误处理模块
pub mod error;

/// 文本处理管道
pub mod pipeline;

/// 边缘缓存
pub mod storage;

pub use config::{constants, ConfigManager, TranslationConfig};
pub use core::{GoogleTranslateClient, TranslatedDocument, TranslationService, Translator};
pub use error::{ErrorSeverity, TranslationError, TranslationResult};
pub use pipeline::{BatchPlan, CollectedTexts, Eligibility, TextCollector, TextFilter, TextItem};
pub use storage::{CachedResponse, EdgeCache, MemoryEdgeCache};
