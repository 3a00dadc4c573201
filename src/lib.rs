//! # Page Translator
//!
//! 把 HTML 页面中的可见文本分批发送给 chat-completion 接口翻译，并原地替换，
//! 支持恢复原文、进度事件和动态内容的重新翻译。
//!
//! ## 模块组织
//!
//! - `parsers` - HTML 解析、DOM 操作与序列化
//! - `translation` - 翻译管道与编排服务
//! - `env` - 环境变量

pub mod env;
pub mod parsers;
pub mod translation;

pub use translation::{RunOutcome, TranslationConfig, TranslationService};
