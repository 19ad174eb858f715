//! 翻译批次模块
//!
//! 把收集到的文本项按核心文本去重（首次出现顺序），再把唯一文本切分为
//! 定长批次。所有批次按顺序拼接后恰好等于唯一文本列表，每个去重键都能
//! 唯一定位到 `(批次, 批内位置)`。

use std::collections::HashMap;

use crate::translation::config::constants;
use crate::translation::pipeline::collector::TextItem;

/// 一个翻译批次
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a> {
    /// 批次序号
    pub index: usize,
    /// 首条文本在唯一列表中的位置
    pub offset: usize,
    pub texts: &'a [String],
}

impl Batch<'_> {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// 去重与分批计划
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    unique: Vec<String>,
    unit_keys: Vec<usize>,
    batch_size: usize,
}

impl BatchPlan {
    /// 按核心文本构建计划
    ///
    /// `batch_size` 会被限制在 `1..=PROVIDER_MAX_BATCH_SIZE`。
    pub fn new<'a, I>(cores: I, batch_size: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut positions: HashMap<&'a str, usize> = HashMap::new();
        let mut unique = Vec::new();
        let mut unit_keys = Vec::new();

        for core in cores {
            let key = *positions.entry(core).or_insert_with(|| {
                unique.push(core.to_string());
                unique.len() - 1
            });
            unit_keys.push(key);
        }

        Self {
            unique,
            unit_keys,
            batch_size: batch_size.clamp(1, constants::PROVIDER_MAX_BATCH_SIZE),
        }
    }

    /// 从文本项构建计划
    pub fn from_units(units: &[TextItem], batch_size: usize) -> Self {
        Self::new(units.iter().map(|unit| unit.core.as_str()), batch_size)
    }

    /// 去重后的文本，按首次出现顺序
    pub fn unique_texts(&self) -> &[String] {
        &self.unique
    }

    /// 每个输入项对应的去重键
    pub fn unit_keys(&self) -> &[usize] {
        &self.unit_keys
    }

    /// 第 `unit` 个输入项的去重键
    pub fn key_of(&self, unit: usize) -> Option<usize> {
        self.unit_keys.get(unit).copied()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn batch_count(&self) -> usize {
        self.unique.len().div_ceil(self.batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.unique.is_empty()
    }

    /// 按顺序遍历所有批次
    pub fn batches(&self) -> impl Iterator<Item = Batch<'_>> + '_ {
        self.unique
            .chunks(self.batch_size)
            .enumerate()
            .map(move |(index, texts)| Batch {
                index,
                offset: index * self.batch_size,
                texts,
            })
    }

    /// 去重键所在的 `(批次序号, 批内位置)`
    pub fn locate(&self, key: usize) -> Option<(usize, usize)> {
        if key < self.unique.len() {
            Some((key / self.batch_size, key % self.batch_size))
        } else {
            None
        }
    }
}
