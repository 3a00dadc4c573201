//! 翻译缓存模块
//!
//! 以"目标语言 + 整批源文本"为键缓存整批译文。键是 blake3 摘要，
//! 容量有上限，满了按 LRU 淘汰最久未使用的批次。缓存只存活于客户端实例的生命周期内。

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::translation::config::constants;

/// 缓存配置
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    /// 最多缓存的批次数
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: constants::DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// 缓存统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_entries: usize,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_requests as f64
        }
    }
}

struct CacheInner {
    entries: LruCache<String, Vec<String>>,
    stats: CacheStats,
}

/// 批次级翻译缓存
pub struct TranslationCache {
    enabled: bool,
    inner: Mutex<CacheInner>,
}

impl TranslationCache {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            enabled: config.enabled,
            inner: Mutex::new(CacheInner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
        }
    }

    /// 生成缓存键
    ///
    /// 语言和每条文本都带长度前缀写入摘要，条目边界不会因文本自身含分隔符而混淆
    pub fn cache_key(texts: &[String], target_lang: &str) -> String {
        let mut hasher = blake3::Hasher::new();
        update_prefixed(&mut hasher, target_lang);
        hasher.update(&(texts.len() as u64).to_le_bytes());
        for text in texts {
            update_prefixed(&mut hasher, text);
        }
        hasher.finalize().to_hex().to_string()
    }

    /// 查询整批译文
    pub fn get(&self, texts: &[String], target_lang: &str) -> Option<Vec<String>> {
        if !self.enabled {
            return None;
        }

        let key = Self::cache_key(texts, target_lang);
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.stats.total_requests += 1;

        match inner.entries.get(&key).cloned() {
            Some(hit) => {
                inner.stats.cache_hits += 1;
                Some(hit)
            }
            None => {
                inner.stats.cache_misses += 1;
                None
            }
        }
    }

    /// 写入整批译文
    pub fn insert(&self, texts: &[String], target_lang: &str, translations: Vec<String>) {
        if !self.enabled {
            return;
        }

        let key = Self::cache_key(texts, target_lang);
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if let Some((evicted_key, _)) = inner.entries.push(key.clone(), translations) {
            if evicted_key != key {
                inner.stats.evictions += 1;
            }
        }
        inner.stats.total_entries = inner.entries.len();
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清空缓存
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.clear();
        inner.stats.total_entries = 0;
    }

    pub fn get_stats(&self) -> CacheStats {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .stats
            .clone()
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

fn update_prefixed(hasher: &mut blake3::Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}
