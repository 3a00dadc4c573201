//! 存储模块
//!
//! 翻译结果缓存与原文备份。

pub mod cache;
pub mod originals;

pub use cache::{CacheConfig, CacheStats, TranslationCache};
pub use originals::{OriginalTextStore, RestoreReport};
