//! 翻译配置管理模块
//!
//! 配置来源按优先级从低到高：内置默认值 → 配置文件 → `EDGE_TRANSLATE_` 前缀的环境变量。
//! 翻译凭据额外支持 `GOOGLE_TRANSLATE_API_KEY` / `GOOGLE_API_KEY`。

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::env::{self, EnvVar};
use crate::translation::error::{helpers::config_error, TranslationResult};

/// 翻译配置常量
pub mod constants {
    pub const DEFAULT_ENDPOINT: &str = "https://translation.googleapis.com/language/translate/v2";
    pub const DEFAULT_MAX_BATCH_SIZE: usize = 80;
    /// Google Translate v2 单次请求最多 128 条
    pub const PROVIDER_MAX_BATCH_SIZE: usize = 128;
    pub const DEFAULT_MAX_CONCURRENT_BATCHES: usize = 4;
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    pub const DEFAULT_LANGUAGE: &str = "zh";
    pub const DEFAULT_ALTERNATE_LANGUAGES: &[&str] = &["en"];
    pub const DEFAULT_LANGUAGE_PARAM: &str = "lang";

    pub const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 3600; // 1小时
    pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1000;

    /// `/api/translate` 单次请求的文本上限
    pub const MAX_API_TEXTS: usize = 120;

    pub const SKIP_ELEMENTS: &[&str] = &[
        "script", "style", "noscript", "code", "pre", "textarea", "input", "select", "option",
        "iframe", "noembed", "noframes", "xmp", "plaintext",
    ];

    /// 序列化时内容不转义的元素，无论配置如何都不翻译
    pub const RAW_TEXT_ELEMENTS: &[&str] = &[
        "script", "style", "noscript", "iframe", "noembed", "noframes", "xmp", "plaintext",
    ];

    pub const OPT_OUT_ATTRIBUTES: &[&str] = &["data-no-translate"];
    pub const OPT_OUT_CLASSES: &[&str] = &["notranslate"];

    pub const ENV_PREFIX: &str = "EDGE_TRANSLATE";

    pub const CONFIG_PATHS: &[&str] = &[
        "edge-translator.toml",
        "config/edge-translator.toml",
        "~/.config/edge-translator/config.toml",
        "/etc/edge-translator/config.toml",
    ];
}

/// 完整配置
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TranslationConfig {
    /// 翻译服务配置
    pub translation: ApiConfig,
    /// 语言配置
    pub languages: LanguageConfig,
    /// 边缘缓存配置
    pub cache: EdgeCacheConfig,
    /// 节点过滤配置
    pub filter: FilterConfig,
}

/// 翻译服务配置
#[derive(Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// 翻译凭据，缺失时网关原样返回页面
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// 翻译端点
    pub endpoint: String,
    /// 每批最多条数
    pub max_batch_size: usize,
    /// 同一请求内并发翻译的批次数
    pub max_concurrent_batches: usize,
    /// 单次翻译请求超时（秒）
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    /// 是否配置了非空凭据
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &self.credential().map(|_| "***"))
            .field("endpoint", &self.endpoint)
            .field("max_batch_size", &self.max_batch_size)
            .field("max_concurrent_batches", &self.max_concurrent_batches)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: constants::DEFAULT_ENDPOINT.to_string(),
            max_batch_size: constants::DEFAULT_MAX_BATCH_SIZE,
            max_concurrent_batches: constants::DEFAULT_MAX_CONCURRENT_BATCHES,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// 语言配置
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LanguageConfig {
    /// 源站语言，该语言的请求直接透传
    pub default: String,
    /// 可翻译的目标语言
    pub alternates: Vec<String>,
    /// 选择语言的查询参数名
    pub query_param: String,
    /// 是否识别 `/<lang>/...` 路径前缀
    pub path_prefix: bool,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            default: constants::DEFAULT_LANGUAGE.to_string(),
            alternates: constants::DEFAULT_ALTERNATE_LANGUAGES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            query_param: constants::DEFAULT_LANGUAGE_PARAM.to_string(),
            path_prefix: true,
        }
    }
}

/// 边缘缓存配置
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EdgeCacheConfig {
    /// 译文页面的 `max-age`（秒）
    pub max_age_secs: u64,
    /// 内存缓存最大条目数
    pub max_entries: usize,
}

impl EdgeCacheConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

impl Default for EdgeCacheConfig {
    fn default() -> Self {
        Self {
            max_age_secs: constants::DEFAULT_CACHE_MAX_AGE_SECS,
            max_entries: constants::DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}

/// 节点过滤配置
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    /// 其内部文本不翻译的标签
    pub exclude_tags: Vec<String>,
    /// 禁止翻译的属性标记
    pub opt_out_attributes: Vec<String>,
    /// 禁止翻译的类名
    pub opt_out_classes: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            exclude_tags: owned(constants::SKIP_ELEMENTS),
            opt_out_attributes: owned(constants::OPT_OUT_ATTRIBUTES),
            opt_out_classes: owned(constants::OPT_OUT_CLASSES),
        }
    }
}

impl TranslationConfig {
    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        let api = &self.translation;
        if api.max_batch_size == 0 || api.max_batch_size > constants::PROVIDER_MAX_BATCH_SIZE {
            return Err(config_error(format!(
                "translation.max_batch_size 必须在 1..={} 之间，当前为 {}",
                constants::PROVIDER_MAX_BATCH_SIZE,
                api.max_batch_size
            )));
        }
        if api.max_concurrent_batches == 0 {
            return Err(config_error("translation.max_concurrent_batches 不能为 0"));
        }
        if !(api.endpoint.starts_with("http://") || api.endpoint.starts_with("https://")) {
            return Err(config_error("translation.endpoint 必须以 http:// 或 https:// 开头"));
        }

        let languages = &self.languages;
        if languages.default.trim().is_empty() {
            return Err(config_error("languages.default 不能为空"));
        }
        if languages.alternates.is_empty() {
            return Err(config_error("languages.alternates 至少需要一个目标语言"));
        }
        if languages
            .alternates
            .iter()
            .any(|lang| lang.eq_ignore_ascii_case(&languages.default))
        {
            return Err(config_error("languages.alternates 不能包含源站默认语言"));
        }
        if languages.query_param.trim().is_empty() {
            return Err(config_error("languages.query_param 不能为空"));
        }

        if self.cache.max_age_secs == 0 {
            return Err(config_error("cache.max_age_secs 必须大于 0"));
        }
        if self.cache.max_entries == 0 {
            return Err(config_error("cache.max_entries 必须大于 0"));
        }

        Ok(())
    }

    /// 统一语言代码大小写
    fn normalize(&mut self) {
        self.languages.default = self.languages.default.trim().to_lowercase();
        for lang in self.languages.alternates.iter_mut() {
            *lang = lang.trim().to_lowercase();
        }
        for tag in self.filter.exclude_tags.iter_mut() {
            *tag = tag.trim().to_lowercase();
        }
    }
}

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: TranslationConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// 加载配置：显式路径优先，否则在默认路径中查找；同时读取 `.env` 与环境变量
    pub fn load(explicit_path: Option<&Path>) -> TranslationResult<Self> {
        dotenv::dotenv().ok();

        let path = match explicit_path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover_config_path(),
        };

        Self::load_from(path.as_deref(), true)
    }

    /// 从指定文件（可选）加载；`include_env` 为 false 时忽略所有环境变量
    pub fn load_from(path: Option<&Path>, include_env: bool) -> TranslationResult<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        if include_env {
            builder = builder.add_source(
                Environment::with_prefix(constants::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("languages.alternates")
                    .with_list_parse_key("filter.exclude_tags")
                    .with_list_parse_key("filter.opt_out_attributes")
                    .with_list_parse_key("filter.opt_out_classes")
                    .try_parsing(true),
            );
        }

        let mut config: TranslationConfig = builder.build()?.try_deserialize()?;

        if include_env && config.translation.credential().is_none() {
            config.translation.api_key = env::translation::ApiKey::get().ok();
        }

        config.normalize();
        config.validate()?;

        if let Some(path) = path {
            tracing::info!("已加载配置文件: {}", path.display());
        }

        Ok(Self {
            config,
            config_path: path.map(Path::to_path_buf),
        })
    }

    /// 在默认路径中查找第一个存在的配置文件
    pub fn discover_config_path() -> Option<PathBuf> {
        constants::CONFIG_PATHS
            .iter()
            .map(|candidate| PathBuf::from(shellexpand::tilde(candidate).into_owned()))
            .find(|path| path.is_file())
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn into_config(self) -> TranslationConfig {
        self.config
    }
}
