//! 目标语言解析
//!
//! 顺序：查询参数（参数名不区分大小写，取值转小写）→ `/<lang>` 路径前缀 → 默认语言。

use url::form_urlencoded;

use crate::network::origin::ProxyRequest;
use crate::translation::config::LanguageConfig;

/// 语言解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageSelection {
    /// 源站语言，无需翻译
    Default,
    /// 已配置的目标语言
    Target(String),
    /// 请求了未配置的语言
    Unsupported(String),
}

/// 语言解析器
#[derive(Debug, Clone)]
pub struct LanguageResolver {
    default: String,
    alternates: Vec<String>,
    query_param: String,
    path_prefix: bool,
}

impl LanguageResolver {
    pub fn new(config: &LanguageConfig) -> Self {
        Self {
            default: config.default.trim().to_lowercase(),
            alternates: config
                .alternates
                .iter()
                .map(|lang| lang.trim().to_lowercase())
                .collect(),
            query_param: config.query_param.clone(),
            path_prefix: config.path_prefix,
        }
    }

    pub fn query_param(&self) -> &str {
        &self.query_param
    }

    pub fn default_language(&self) -> &str {
        &self.default
    }

    /// 解析请求的目标语言
    pub fn resolve(&self, request: &ProxyRequest) -> LanguageSelection {
        if let Some(lang) = self.from_query(request.query()) {
            return self.classify(lang);
        }

        if self.path_prefix {
            if let Some(lang) = self.from_path(request.path()) {
                return LanguageSelection::Target(lang);
            }
        }

        LanguageSelection::Default
    }

    fn from_query(&self, query: Option<&str>) -> Option<String> {
        form_urlencoded::parse(query?.as_bytes())
            .find(|(name, value)| {
                name.eq_ignore_ascii_case(&self.query_param) && !value.trim().is_empty()
            })
            .map(|(_, value)| value.trim().to_lowercase())
    }

    fn from_path(&self, path: &str) -> Option<String> {
        let first = path.trim_start_matches('/').split('/').next()?;
        let first = first.to_lowercase();
        self.alternates.iter().find(|lang| **lang == first).cloned()
    }

    fn classify(&self, lang: String) -> LanguageSelection {
        if lang == self.default {
            LanguageSelection::Default
        } else if self.alternates.contains(&lang) {
            LanguageSelection::Target(lang)
        } else {
            LanguageSelection::Unsupported(lang)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> LanguageResolver {
        LanguageResolver::new(&LanguageConfig {
            alternates: vec!["en".to_string(), "ja".to_string()],
            ..LanguageConfig::default()
        })
    }

    fn resolve(path_and_query: &str) -> LanguageSelection {
        resolver().resolve(&ProxyRequest::get(path_and_query))
    }

    #[test]
    fn test_query_parameter() {
        assert_eq!(resolve("/?lang=en"), LanguageSelection::Target("en".into()));
        assert_eq!(resolve("/?LANG=EN"), LanguageSelection::Target("en".into()));
        assert_eq!(resolve("/?x=1&lang=ja"), LanguageSelection::Target("ja".into()));
        assert_eq!(resolve("/?lang=zh"), LanguageSelection::Default);
        assert_eq!(resolve("/?lang=ZH"), LanguageSelection::Default);
        assert_eq!(
            resolve("/?lang=fr"),
            LanguageSelection::Unsupported("fr".into())
        );
    }

    #[test]
    fn test_empty_query_value_falls_through() {
        assert_eq!(resolve("/?lang="), LanguageSelection::Default);
        assert_eq!(resolve("/en/?lang="), LanguageSelection::Target("en".into()));
    }

    #[test]
    fn test_path_prefix() {
        assert_eq!(resolve("/en"), LanguageSelection::Target("en".into()));
        assert_eq!(resolve("/en/about"), LanguageSelection::Target("en".into()));
        assert_eq!(resolve("/EN/about"), LanguageSelection::Target("en".into()));
        assert_eq!(resolve("/english/about"), LanguageSelection::Default);
        assert_eq!(resolve("/about"), LanguageSelection::Default);
        assert_eq!(resolve("/"), LanguageSelection::Default);
    }

    #[test]
    fn test_query_wins_over_path() {
        assert_eq!(resolve("/en/about?lang=zh"), LanguageSelection::Default);
    }

    #[test]
    fn test_path_prefix_can_be_disabled() {
        let resolver = LanguageResolver::new(&LanguageConfig {
            path_prefix: false,
            ..LanguageConfig::default()
        });
        assert_eq!(
            resolver.resolve(&ProxyRequest::get("/en/about")),
            LanguageSelection::Default
        );
    }
}
