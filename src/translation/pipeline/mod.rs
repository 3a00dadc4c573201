//! 翻译管道模块
//!
//! 提供文本处理管道，包括收集、过滤和批次处理

pub mod batch;
pub mod collector;
pub mod filters;

pub use batch::{Batch, BatchManager, BatchPolicy, BatchStats};
pub use collector::{CollectionStats, CollectorConfig, TextCollector, TextUnit, TextUnits};
pub use filters::TextFilter;
