//! HTML解析和处理模块
//!
//! - `dom`: 基础DOM操作
//! - `metadata`: 文档元数据（字符集）
//! - `serializer`: 序列化功能

pub mod dom;
pub mod metadata;
pub mod serializer;

pub use dom::{
    detach_node, find_nodes, get_node_attr, get_parent_node, get_text_content, html_to_dom,
    is_attached, set_node_attr, set_text_content,
};
pub use metadata::{get_charset, parse_content_type};
pub use serializer::serialize_document;
