//! 文本收集器模块
//!
//! 按文档顺序（深度优先、先序）遍历内容树，产出可翻译的文本节点。
//! 遍历是惰性的：`TextCollector::units` 返回一个迭代器，每次调用都会从根节点重新开始。

use std::rc::Rc;

use markup5ever_rcdom::{Handle, NodeData};

use crate::parsers::html::get_node_attr;
use crate::translation::config::constants;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::pipeline::filters::TextFilter;

/// 一个可翻译的文本位置
#[derive(Debug, Clone)]
pub struct TextUnit {
    /// 在本次遍历中的序号
    pub id: usize,
    /// DOM文本节点引用
    pub node: Handle,
    /// 去除首尾空白后的源文本
    pub source: String,
    /// 节点原始文本（未裁剪）
    pub original: String,
}

impl TextUnit {
    pub fn new(id: usize, node: Handle, original: String) -> Self {
        Self {
            id,
            node,
            source: original.trim().to_string(),
            original,
        }
    }

    /// 源文本字符数
    pub fn char_count(&self) -> usize {
        self.source.chars().count()
    }

    /// 源文本按空白切分后的词数
    pub fn word_count(&self) -> usize {
        self.source.split_whitespace().count()
    }

    /// 节点身份（同一节点的多次收集得到相同的值）
    pub fn node_key(&self) -> usize {
        Rc::as_ptr(&self.node) as usize
    }
}

/// 文本收集器配置
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 跳过的元素标签（不可见或非语言内容）
    pub skip_elements: Vec<String>,
    /// 可编辑输入元素
    pub editable_elements: Vec<String>,
    /// 最小文本长度
    pub min_text_length: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            skip_elements: constants::SKIP_ELEMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            editable_elements: constants::EDITABLE_ELEMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_text_length: constants::MIN_TEXT_LENGTH,
        }
    }
}

/// DOM文本收集器
pub struct TextCollector {
    config: CollectorConfig,
    filter: TextFilter,
    stats: CollectionStats,
}

impl TextCollector {
    /// 创建新的文本收集器
    pub fn new(config: CollectorConfig) -> Self {
        let filter = TextFilter::with_min_length(config.min_text_length);
        Self {
            config,
            filter,
            stats: CollectionStats::default(),
        }
    }

    /// 惰性遍历可翻译文本
    pub fn units<'a>(&'a self, root: &Handle) -> TextUnits<'a> {
        TextUnits {
            collector: self,
            stack: vec![root.clone()],
            next_id: 0,
            stats: CollectionStats::default(),
        }
    }

    /// 收集全部可翻译文本，并更新统计信息
    pub fn collect_translatable_texts(&mut self, root: &Handle) -> TranslationResult<Vec<TextUnit>> {
        match root.data {
            NodeData::Document | NodeData::Element { .. } => {}
            _ => {
                return Err(TranslationError::SelectionError(
                    "content root must be a document or an element".to_string(),
                ))
            }
        }

        let mut units = self.units(root);
        let texts: Vec<TextUnit> = units.by_ref().collect();
        let mut stats = units.stats;
        stats.final_text_count = texts.len();
        self.stats = stats;

        tracing::debug!(
            "collected {} translatable texts ({} nodes visited, {} subtrees skipped)",
            self.stats.final_text_count,
            self.stats.nodes_visited,
            self.stats.nodes_skipped
        );

        Ok(texts)
    }

    /// 元素自身是否把整棵子树排除在翻译之外
    pub fn is_excluded_element(&self, node: &Handle) -> bool {
        let NodeData::Element { ref name, .. } = node.data else {
            return false;
        };
        let tag_name = name.local.as_ref().to_lowercase();

        if self.config.skip_elements.contains(&tag_name)
            || self.config.editable_elements.contains(&tag_name)
        {
            return true;
        }

        if let Some(value) = get_node_attr(node, "contenteditable") {
            if !value.trim().eq_ignore_ascii_case("false") {
                return true;
            }
        }

        is_hidden(node)
    }

    /// 获取收集统计信息
    pub fn get_stats(&self) -> &CollectionStats {
        &self.stats
    }

    pub fn filter(&self) -> &TextFilter {
        &self.filter
    }
}

impl Default for TextCollector {
    fn default() -> Self {
        Self::new(CollectorConfig::default())
    }
}

/// 元素是否被 `hidden`、`aria-hidden` 或内联样式隐藏
fn is_hidden(node: &Handle) -> bool {
    if get_node_attr(node, "hidden").is_some() {
        return true;
    }

    if get_node_attr(node, "aria-hidden")
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
    {
        return true;
    }

    let Some(style) = get_node_attr(node, "style") else {
        return false;
    };

    style.split(';').any(|declaration| {
        let Some((property, value)) = declaration.split_once(':') else {
            return false;
        };
        let property = property.trim().to_lowercase();
        let value = value
            .trim()
            .trim_end_matches("!important")
            .trim()
            .to_lowercase();

        matches!(
            (property.as_str(), value.as_str()),
            ("display", "none") | ("visibility", "hidden") | ("visibility", "collapse")
        )
    })
}

/// 可翻译文本的惰性迭代器
pub struct TextUnits<'a> {
    collector: &'a TextCollector,
    stack: Vec<Handle>,
    next_id: usize,
    stats: CollectionStats,
}

impl Iterator for TextUnits<'_> {
    type Item = TextUnit;

    fn next(&mut self) -> Option<TextUnit> {
        while let Some(node) = self.stack.pop() {
            self.stats.nodes_visited += 1;

            match node.data {
                NodeData::Text { ref contents } => {
                    self.stats.text_nodes_found += 1;
                    let text = contents.borrow().to_string();

                    if self.collector.filter.should_translate(&text) {
                        self.stats.translatable_texts += 1;
                        let unit = TextUnit::new(self.next_id, node.clone(), text);
                        self.next_id += 1;
                        return Some(unit);
                    }

                    self.stats.filtered_texts += 1;
                }
                NodeData::Element { .. } => {
                    if self.collector.is_excluded_element(&node) {
                        self.stats.nodes_skipped += 1;
                        continue;
                    }
                    self.push_children(&node);
                }
                NodeData::Document => self.push_children(&node),
                _ => {}
            }
        }

        None
    }
}

impl TextUnits<'_> {
    fn push_children(&mut self, node: &Handle) {
        for child in node.children.borrow().iter().rev() {
            self.stack.push(child.clone());
        }
    }
}

/// 收集统计信息
#[derive(Debug, Clone, Default)]
pub struct CollectionStats {
    pub nodes_visited: usize,
    pub nodes_skipped: usize,
    pub text_nodes_found: usize,
    pub translatable_texts: usize,
    pub filtered_texts: usize,
    pub final_text_count: usize,
}

impl CollectionStats {
    /// 获取可翻译率
    pub fn translatability_rate(&self) -> f32 {
        if self.text_nodes_found == 0 {
            0.0
        } else {
            self.translatable_texts as f32 / self.text_nodes_found as f32
        }
    }
}
