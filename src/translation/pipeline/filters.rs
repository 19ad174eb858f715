//! 文本过滤器模块
//!
//! 判断一个文本节点是否需要翻译。规则按顺序匹配，命中即返回：
//!
//! 1. 祖先元素属于排除标签（script、style、pre 等）
//! 2. 祖先元素带有禁止翻译标记（`data-no-translate`、`.notranslate`、`translate="no"`）
//! 3. 去除首尾空白后为空
//! 4. 不含任何拉丁字母或汉字
//!
//! 其余文本均可翻译。过滤器是纯函数，不修改 DOM。

use std::collections::HashSet;
use std::sync::OnceLock;

use markup5ever_rcdom::Handle;
use regex::Regex;

use crate::parsers::html::{get_node_attr, get_node_name, has_node_attr, node_has_class};
use crate::translation::config::{constants::RAW_TEXT_ELEMENTS, FilterConfig};

/// 跳过原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 位于排除标签内部
    ExcludedTag(String),
    /// 作者显式禁止翻译
    OptOut,
    /// 只有空白
    Whitespace,
    /// 不含拉丁字母或汉字
    NoLetters,
}

/// 节点分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Skip(SkipReason),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// 文本过滤器
#[derive(Debug, Clone)]
pub struct TextFilter {
    exclude_tags: HashSet<String>,
    opt_out_attributes: Vec<String>,
    opt_out_classes: Vec<String>,
}

impl Default for TextFilter {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}

/// 拉丁字母或汉字
fn letter_regex() -> &'static Regex {
    static LETTERS: OnceLock<Regex> = OnceLock::new();
    LETTERS.get_or_init(|| Regex::new(r"[\p{Latin}\p{Han}]").expect("letter regex is valid"))
}

impl TextFilter {
    /// 创建新的文本过滤器
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            exclude_tags: config
                .exclude_tags
                .iter()
                .map(|tag| tag.to_lowercase())
                .collect(),
            opt_out_attributes: config.opt_out_attributes.clone(),
            opt_out_classes: config.opt_out_classes.clone(),
        }
    }

    /// 对文本节点分类
    ///
    /// `ancestors` 为从文档根到父元素的元素链，顺序不影响结果。
    pub fn classify(&self, ancestors: &[Handle], text: &str) -> Eligibility {
        for ancestor in ancestors {
            if let Some(tag) = self.excluded_tag(ancestor) {
                return Eligibility::Skip(SkipReason::ExcludedTag(tag));
            }
        }

        if ancestors.iter().any(|ancestor| self.has_opt_out_marker(ancestor)) {
            return Eligibility::Skip(SkipReason::OptOut);
        }

        self.classify_text(text)
    }

    /// 只检查文本本身（规则 3、4）
    pub fn classify_text(&self, text: &str) -> Eligibility {
        let trimmed = text.trim();

        if trimmed.is_empty() {
            return Eligibility::Skip(SkipReason::Whitespace);
        }

        if !letter_regex().is_match(trimmed) {
            return Eligibility::Skip(SkipReason::NoLetters);
        }

        Eligibility::Eligible
    }

    /// 检查元素是否使整棵子树都不可翻译（规则 1、2）
    pub fn excludes_subtree(&self, element: &Handle) -> Option<SkipReason> {
        if let Some(tag) = self.excluded_tag(element) {
            return Some(SkipReason::ExcludedTag(tag));
        }
        if self.has_opt_out_marker(element) {
            return Some(SkipReason::OptOut);
        }
        None
    }

    fn excluded_tag(&self, element: &Handle) -> Option<String> {
        let tag = get_node_name(element)?.to_lowercase();
        if self.exclude_tags.contains(&tag) || RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
            Some(tag)
        } else {
            None
        }
    }

    fn has_opt_out_marker(&self, element: &Handle) -> bool {
        if self
            .opt_out_attributes
            .iter()
            .any(|attr| has_node_attr(element, attr))
        {
            return true;
        }

        if self
            .opt_out_classes
            .iter()
            .any(|class| node_has_class(element, class))
        {
            return true;
        }

        // HTML 标准的 translate="no"
        get_node_attr(element, "translate")
            .map(|value| value.trim().eq_ignore_ascii_case("no"))
            .unwrap_or(false)
    }
}
