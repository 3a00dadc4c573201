//! # 解析器模块
//!
//! HTML 文档的解析、DOM 操作与序列化。

pub mod html;

pub use html::{get_charset, html_to_dom, serialize_document};
