//! 翻译模块
//!
//! 采用清晰的模块化架构：
//! - **core**: 编排服务、翻译客户端、译文对齐与回写
//! - **pipeline**: 文本处理管道（收集、过滤、批次）
//! - **storage**: 批次缓存和原文备份
//! - **config**: 配置管理
//! - **error**: 错误处理
//! - **events** / **messages**: 与控制端之间的事件和请求
//! - **observer**: 动态内容的去抖观察
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use page_translator::parsers::html_to_dom;
//! use page_translator::translation::{ConfigManager, Request, TranslationService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dom = html_to_dom(b"<html><body><p>Good morning</p></body></html>", "utf-8")?;
//! let mut config = ConfigManager::new()?.into_config();
//! config.target_lang = "Spanish".to_string();
//! let service = TranslationService::new(config, dom.document.clone())?;
//!
//! let response = service
//!     .handle(Request::Translate {
//!         api_key: "sk-...".to_string(),
//!         target_language: "Spanish".to_string(),
//!     })
//!     .await;
//! println!("{}", serde_json::to_string(&response)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod messages;
pub mod observer;
pub mod pipeline;
pub mod stats;
pub mod storage;

pub use config::{
    constants, BatchMode, ConfigManager, TranslationConfig,
};
pub use core::{
    Applier, BatchTranslation, Reconciliation, RunOutcome, RunPhase, RunStatus,
    TranslationClient, TranslationService,
};
pub use error::{ErrorCategory, ErrorSeverity, TranslationError, TranslationResult};
pub use events::{ProgressReporter, TranslationEvent};
pub use messages::{Request, Response, Settings};
pub use observer::{observe, DocumentObserver, MutationNotifier};
pub use pipeline::{Batch, BatchManager, BatchPolicy, TextCollector, TextFilter, TextUnit};
pub use stats::{PageStats, RunStats, UsageStats};
pub use storage::{CacheConfig, CacheStats, OriginalTextStore, TranslationCache};

/// 检查文本是否会被选中翻译（使用默认过滤规则）
///
/// ```rust
/// use page_translator::translation::should_translate;
///
/// assert!(should_translate("Hello World"));
/// assert!(!should_translate("123"));
/// assert!(!should_translate("   "));
/// ```
pub fn should_translate(text: &str) -> bool {
    TextFilter::new().should_translate(text)
}
