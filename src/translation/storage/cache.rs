//! 边缘缓存模块
//!
//! [`EdgeCache`] 只有 `lookup` / `put` 两个操作，键是规范化后的请求 URL。
//! 过期时间不走额外接口，而是读取缓存响应自身的 `Cache-Control: max-age`。
//!
//! [`MemoryEdgeCache`] 是进程内实现：键做 blake3 摘要，条目数有上限，
//! 满了先清理过期条目，仍然不够再淘汰最早写入的条目。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use blake3::Hasher;
use dashmap::DashMap;
use reqwest::header::{HeaderMap, CACHE_CONTROL};
use reqwest::StatusCode;
use serde::Serialize;

use crate::translation::config::EdgeCacheConfig;
use crate::translation::error::TranslationResult;

/// 缓存的完整响应
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl CachedResponse {
    /// 响应声明的新鲜期
    ///
    /// `s-maxage` 优先于 `max-age`；带 `no-store` 时返回 `Some(0)`。
    pub fn freshness(&self) -> Option<Duration> {
        freshness_from_headers(&self.headers)
    }
}

/// 从 `Cache-Control` 解析新鲜期
pub fn freshness_from_headers(headers: &HeaderMap) -> Option<Duration> {
    let mut max_age = None;
    let mut shared_max_age = None;

    for value in headers.get_all(CACHE_CONTROL) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for directive in value.split(',') {
            let directive = directive.trim();
            let (name, arg) = match directive.split_once('=') {
                Some((name, arg)) => (name.trim(), Some(arg.trim().trim_matches('"'))),
                None => (directive, None),
            };

            if name.eq_ignore_ascii_case("no-store") {
                return Some(Duration::ZERO);
            }

            let seconds = arg.and_then(|arg| arg.parse::<u64>().ok());
            if name.eq_ignore_ascii_case("s-maxage") {
                shared_max_age = seconds.or(shared_max_age);
            } else if name.eq_ignore_ascii_case("max-age") {
                max_age = seconds.or(max_age);
            }
        }
    }

    shared_max_age.or(max_age).map(Duration::from_secs)
}

/// 边缘缓存接口
#[async_trait]
pub trait EdgeCache: Send + Sync {
    /// 查找缓存，未命中或已过期返回 `None`
    async fn lookup(&self, key: &str) -> Option<CachedResponse>;

    /// 写入缓存（同键覆盖）
    async fn put(&self, key: &str, response: CachedResponse) -> TranslationResult<()>;

    /// 运行统计；外部缓存可以不提供
    fn stats(&self) -> Option<CacheStats> {
        None
    }
}

/// 缓存统计信息
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
struct StoredEntry {
    response: CachedResponse,
    stored_at: Instant,
    expires_at: Instant,
}

impl StoredEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// 进程内边缘缓存
#[derive(Debug)]
pub struct MemoryEdgeCache {
    entries: DashMap<String, StoredEntry>,
    max_entries: usize,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for MemoryEdgeCache {
    fn default() -> Self {
        Self::new(&EdgeCacheConfig::default())
    }
}

impl MemoryEdgeCache {
    /// 创建缓存；响应未声明 `max-age` 时使用配置的新鲜期
    pub fn new(config: &EdgeCacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: config.max_entries.max(1),
            default_ttl: config.max_age(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// 生成存储键
    pub fn storage_key(key: &str) -> String {
        let mut hasher = Hasher::new();
        hasher.update(key.as_bytes());
        format!("edge:{}", hasher.finalize().to_hex())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// 清理过期条目，返回清理数量
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    /// 为新条目腾出空间
    fn make_room(&self) {
        if self.entries.len() < self.max_entries {
            return;
        }

        let removed = self.cleanup_expired();
        if removed > 0 {
            tracing::debug!("边缘缓存清理过期条目: {}", removed);
        }

        while self.entries.len() >= self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().stored_at)
                .map(|entry| entry.key().clone());

            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                    tracing::debug!("边缘缓存淘汰最早条目: {}", key);
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl EdgeCache for MemoryEdgeCache {
    async fn lookup(&self, key: &str) -> Option<CachedResponse> {
        let storage_key = Self::storage_key(key);
        let now = Instant::now();

        let found = self.entries.get(&storage_key).map(|entry| {
            if entry.is_expired(now) {
                None
            } else {
                Some(entry.response.clone())
            }
        });

        match found {
            Some(Some(response)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(response)
            }
            Some(None) => {
                self.entries
                    .remove_if(&storage_key, |_, entry| entry.is_expired(now));
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    async fn put(&self, key: &str, response: CachedResponse) -> TranslationResult<()> {
        let ttl = response.freshness().unwrap_or(self.default_ttl);
        if ttl.is_zero() {
            tracing::debug!("响应不可缓存，跳过: {}", key);
            return Ok(());
        }

        let storage_key = Self::storage_key(key);
        if !self.entries.contains_key(&storage_key) {
            self.make_room();
        }

        let now = Instant::now();
        self.entries.insert(
            storage_key,
            StoredEntry {
                response,
                stored_at: now,
                expires_at: now + ttl,
            },
        );

        Ok(())
    }

    fn stats(&self) -> Option<CacheStats> {
        Some(MemoryEdgeCache::stats(self))
    }
}
