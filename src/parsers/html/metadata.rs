use markup5ever_rcdom::Handle;

use super::dom::{find_nodes, get_node_attr};

/// 解析 Content-Type 字符串，返回 (媒体类型, 字符集)
pub fn parse_content_type(content_type: &str) -> (String, String) {
    let mut parts = content_type.split(';');
    let media_type = parts
        .next()
        .map(|part| part.trim().to_lowercase())
        .unwrap_or_default();
    let mut charset = String::new();

    for part in parts {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("charset=") {
            charset = value.trim_matches('"').to_string();
        }
    }

    (media_type, charset)
}

/// 获取文档字符集
///
/// 同时识别 `<meta charset="...">` 与
/// `<meta http-equiv="content-type" content="text/html; charset=...">` 两种写法。
pub fn get_charset(node: &Handle) -> Option<String> {
    for meta_node in find_nodes(node, &["html", "head", "meta"]).iter() {
        if let Some(charset) = get_node_attr(meta_node, "charset") {
            return Some(charset);
        }

        if get_node_attr(meta_node, "http-equiv")
            .unwrap_or_default()
            .eq_ignore_ascii_case("content-type")
        {
            if let Some(content) = get_node_attr(meta_node, "content") {
                let (_media_type, charset) = parse_content_type(&content);
                if !charset.is_empty() {
                    return Some(charset);
                }
            }
        }
    }

    None
}
