//! 文档回写模块
//!
//! 把译文写回原节点（保留前后空白），在根元素上设置 `lang`，再序列化。
//! 没有译文的键回退为原文，因此文档总是可渲染的。

use markup5ever_rcdom::RcDom;

use crate::parsers::html::{get_document_element, serialize_document, set_node_attr, set_text_content};
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::pipeline::batch::BatchPlan;
use crate::translation::pipeline::collector::CollectedTexts;

/// 回写统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// 写入了译文的节点数
    pub translated: usize,
    /// 回退为原文的节点数
    pub fallbacks: usize,
}

/// 把译文写回 DOM
///
/// `translations` 与 `plan.unique_texts()` 按位置对齐，`None` 或空串表示无译文。
pub fn apply_translations(
    collected: &CollectedTexts,
    plan: &BatchPlan,
    translations: &[Option<String>],
) -> TranslationResult<RewriteStats> {
    if plan.unit_keys().len() != collected.len() {
        return Err(TranslationError::ResultCountMismatch {
            expected: collected.len(),
            actual: plan.unit_keys().len(),
        });
    }
    if translations.len() != plan.unique_texts().len() {
        return Err(TranslationError::ResultCountMismatch {
            expected: plan.unique_texts().len(),
            actual: translations.len(),
        });
    }

    let mut stats = RewriteStats::default();

    for (unit, &key) in collected.units().iter().zip(plan.unit_keys()) {
        let node = collected.node(unit.node).ok_or_else(|| {
            TranslationError::MalformedDocument(format!("节点下标越界: {}", unit.node))
        })?;

        let core = match translations[key].as_deref() {
            Some(translated) if !translated.is_empty() => {
                stats.translated += 1;
                translated
            }
            _ => {
                stats.fallbacks += 1;
                unit.core.as_str()
            }
        };

        set_text_content(node, &unit.reassemble(core));
    }

    Ok(stats)
}

/// 在根元素上设置 `lang` 属性
pub fn set_document_language(dom: &RcDom, lang: &str) -> TranslationResult<()> {
    let root = get_document_element(dom)
        .ok_or_else(|| TranslationError::MalformedDocument("文档缺少根元素".to_string()))?;
    set_node_attr(&root, "lang", Some(lang.to_string()));
    Ok(())
}

/// 回写、设置语言并序列化
pub fn rewrite_document(
    dom: &RcDom,
    collected: &CollectedTexts,
    plan: &BatchPlan,
    translations: &[Option<String>],
    target_lang: &str,
    document_encoding: &str,
) -> TranslationResult<(Vec<u8>, RewriteStats)> {
    let stats = apply_translations(collected, plan, translations)?;
    set_document_language(dom, target_lang)?;
    let bytes = serialize_document(dom, document_encoding)?;

    tracing::debug!(
        "文档回写完成: 译文 {} 处, 回退 {} 处",
        stats.translated,
        stats.fallbacks
    );

    Ok((bytes, stats))
}
