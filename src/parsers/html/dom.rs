use std::io;

use encoding_rs::Encoding;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// 将 HTML 字节转换为 DOM
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> io::Result<RcDom> {
    let s: String = if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
        let (string, _, _) = encoding.decode(data);
        string.to_string()
    } else {
        String::from_utf8_lossy(data).to_string()
    };

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())
}

/// 查找指定路径的DOM节点
pub fn find_nodes(node: &Handle, node_names: &[&str]) -> Vec<Handle> {
    let mut found_nodes = Vec::new();
    let Some((node_name, rest)) = node_names.split_first() else {
        return found_nodes;
    };

    let matches = matches!(node.data, NodeData::Element { ref name, .. } if &*name.local == *node_name);

    if matches && rest.is_empty() {
        found_nodes.push(node.clone());
    }

    if matches && !rest.is_empty() {
        for child_node in node.children.borrow().iter() {
            found_nodes.append(&mut find_nodes(child_node, rest));
        }
    } else {
        for child_node in node.children.borrow().iter() {
            found_nodes.append(&mut find_nodes(child_node, node_names));
        }
    }

    found_nodes
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == attr_name {
                    return Some(attr.value.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

/// 获取父节点
///
/// rcdom 把父节点存放在 `Cell` 中，读取时必须取出再放回。
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let parent = child.parent.take();
    let upgraded = parent.as_ref().and_then(|weak| weak.upgrade());
    child.parent.set(parent);
    upgraded
}

/// 节点是否仍然挂在文档树上（沿父链能走到 Document 节点）
pub fn is_attached(node: &Handle) -> bool {
    let mut current = node.clone();
    loop {
        if let NodeData::Document = current.data {
            return true;
        }
        match get_parent_node(&current) {
            Some(parent) => current = parent,
            None => return false,
        }
    }
}

/// 读取文本节点内容
pub fn get_text_content(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

/// 替换文本节点内容，非文本节点返回 `false`
pub fn set_text_content(node: &Handle, text: &str) -> bool {
    if let NodeData::Text { contents } = &node.data {
        *contents.borrow_mut() = text.into();
        true
    } else {
        false
    }
}

/// 设置节点属性
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    use html5ever::interface::{Attribute, QualName};
    use html5ever::tendril::format_tendril;
    use html5ever::{namespace_url, ns, LocalName};

    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut i = 0;
        let mut found_existing_attr: bool = false;

        while i < attrs_mut.len() {
            if &attrs_mut[i].name.local == attr_name {
                found_existing_attr = true;

                if let Some(attr_value) = attr_value.clone() {
                    attrs_mut[i].value.clear();
                    attrs_mut[i].value.push_slice(attr_value.as_str());
                } else {
                    // Remove attr completely if attr_value is not defined
                    attrs_mut.remove(i);
                    continue;
                }
            }

            i += 1;
        }

        if !found_existing_attr {
            if let Some(attr_value) = attr_value {
                let name = LocalName::from(attr_name);

                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), name),
                    value: format_tendril!("{}", attr_value),
                });
            }
        }
    };
}

/// 把节点从父节点中摘除
pub fn detach_node(node: &Handle) {
    if let Some(parent) = get_parent_node(node) {
        parent
            .children
            .borrow_mut()
            .retain(|child| !std::rc::Rc::ptr_eq(child, node));
        node.parent.set(None);
    }
}
