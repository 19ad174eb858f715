//! 文本收集器模块
//!
//! 按文档先序遍历 DOM，收集所有可翻译的文本节点。节点句柄存放在
//! [`CollectedTexts`] 的节点表里，文本项只保存下标，回写阶段按下标修改节点。

use markup5ever_rcdom::{Handle, NodeData};

use crate::translation::pipeline::filters::{Eligibility, SkipReason, TextFilter};

/// 一个可翻译的文本位置
///
/// 原始文本被拆为 `leading + core + trailing`，`core` 即去重键。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextItem {
    /// 节点表中的下标
    pub node: usize,
    /// 前导空白
    pub leading: String,
    /// 核心文本
    pub core: String,
    /// 尾随空白
    pub trailing: String,
}

impl TextItem {
    /// 拆分原始文本
    pub fn split(node: usize, raw: &str) -> Self {
        let (leading, core, trailing) = split_whitespace(raw);
        Self {
            node,
            leading: leading.to_string(),
            core: core.to_string(),
            trailing: trailing.to_string(),
        }
    }

    /// 用给定的核心文本重新拼接
    pub fn reassemble(&self, core: &str) -> String {
        let mut text = String::with_capacity(self.leading.len() + core.len() + self.trailing.len());
        text.push_str(&self.leading);
        text.push_str(core);
        text.push_str(&self.trailing);
        text
    }
}

/// 拆分前导空白、核心文本与尾随空白
pub fn split_whitespace(raw: &str) -> (&str, &str, &str) {
    let without_leading = raw.trim_start();
    let leading = &raw[..raw.len() - without_leading.len()];
    let core = without_leading.trim_end();
    let trailing = &without_leading[core.len()..];
    (leading, core, trailing)
}

/// 一次遍历的收集结果
#[derive(Debug, Default)]
pub struct CollectedTexts {
    arena: Vec<Handle>,
    units: Vec<TextItem>,
}

impl CollectedTexts {
    /// 按文档顺序排列的文本项
    pub fn units(&self) -> &[TextItem] {
        &self.units
    }

    /// 根据下标取节点
    pub fn node(&self, index: usize) -> Option<&Handle> {
        self.arena.get(index)
    }

    /// 所有核心文本（文档顺序，含重复）
    pub fn cores(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|unit| unit.core.as_str())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn push(&mut self, node: &Handle, raw: &str) {
        let index = self.arena.len();
        self.arena.push(node.clone());
        self.units.push(TextItem::split(index, raw));
    }
}

/// 收集统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub nodes_visited: usize,
    pub text_nodes_found: usize,
    pub translatable_texts: usize,
    pub filtered_texts: usize,
    /// 因排除标签或禁止翻译标记而整体跳过的子树
    pub subtrees_skipped: usize,
}

/// DOM 文本收集器
#[derive(Debug, Clone, Default)]
pub struct TextCollector {
    filter: TextFilter,
    stats: CollectionStats,
}

impl TextCollector {
    /// 创建新的文本收集器
    pub fn new(filter: TextFilter) -> Self {
        Self {
            filter,
            stats: CollectionStats::default(),
        }
    }

    /// 收集可翻译文本
    pub fn collect(&mut self, root: &Handle) -> CollectedTexts {
        self.stats = CollectionStats::default();

        let mut collected = CollectedTexts::default();
        self.collect_recursive(root, &mut collected);

        tracing::debug!(
            "文本收集完成: 访问 {} 个节点, 可翻译 {} 条, 过滤 {} 条, 跳过 {} 个子树",
            self.stats.nodes_visited,
            self.stats.translatable_texts,
            self.stats.filtered_texts,
            self.stats.subtrees_skipped
        );

        collected
    }

    /// 递归收集文本
    fn collect_recursive(&mut self, node: &Handle, collected: &mut CollectedTexts) {
        self.stats.nodes_visited += 1;

        match node.data {
            NodeData::Text { ref contents } => {
                self.stats.text_nodes_found += 1;

                let text = contents.borrow();
                match self.filter.classify_text(&text) {
                    Eligibility::Eligible => {
                        collected.push(node, &text);
                        self.stats.translatable_texts += 1;
                    }
                    Eligibility::Skip(_) => {
                        self.stats.filtered_texts += 1;
                    }
                }
            }
            NodeData::Element { .. } => {
                if let Some(reason) = self.filter.excludes_subtree(node) {
                    self.stats.subtrees_skipped += 1;
                    if let SkipReason::ExcludedTag(ref tag) = reason {
                        tracing::trace!("跳过排除标签 <{}>", tag);
                    }
                    return;
                }

                for child in node.children.borrow().iter() {
                    self.collect_recursive(child, collected);
                }
            }
            _ => {
                for child in node.children.borrow().iter() {
                    self.collect_recursive(child, collected);
                }
            }
        }
    }

    /// 获取统计信息
    pub fn stats(&self) -> &CollectionStats {
        &self.stats
    }
}
