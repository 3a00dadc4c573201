//! 原文备份
//!
//! 节点第一次被翻译时记录其原始文本，之后的翻译不会覆盖。
//! 只持有节点的弱引用：节点被移出文档或释放后，恢复时直接跳过。

use std::collections::HashMap;
use std::rc::Rc;

use markup5ever_rcdom::{Handle, WeakHandle};

use crate::parsers::html::{is_attached, set_text_content};

struct OriginalEntry {
    node: WeakHandle,
    original: String,
}

/// 恢复结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    /// 节点已不在文档中而被跳过的条目
    pub skipped: usize,
}

/// 节点身份到原始文本的映射
#[derive(Default)]
pub struct OriginalTextStore {
    entries: HashMap<usize, OriginalEntry>,
    /// 记录顺序，保证恢复按文档顺序进行
    order: Vec<usize>,
}

impl OriginalTextStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(node: &Handle) -> usize {
        Rc::as_ptr(node) as usize
    }

    /// 记录原文；已记录过的节点保持不变，返回是否新增
    pub fn record(&mut self, node: &Handle, original: &str) -> bool {
        let key = Self::key(node);
        if self.entries.contains_key(&key) {
            return false;
        }

        self.entries.insert(
            key,
            OriginalEntry {
                node: Rc::downgrade(node),
                original: original.to_string(),
            },
        );
        self.order.push(key);
        true
    }

    pub fn original_of(&self, node: &Handle) -> Option<&str> {
        self.entries
            .get(&Self::key(node))
            .map(|entry| entry.original.as_str())
    }

    pub fn contains(&self, node: &Handle) -> bool {
        self.entries.contains_key(&Self::key(node))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 把仍在文档中的节点写回原文，然后清空备份
    pub fn restore_all(&mut self) -> RestoreReport {
        let mut report = RestoreReport::default();

        for key in self.order.drain(..) {
            let Some(entry) = self.entries.remove(&key) else {
                continue;
            };

            match entry.node.upgrade() {
                Some(node) if is_attached(&node) && set_text_content(&node, &entry.original) => {
                    report.restored += 1;
                }
                _ => report.skipped += 1,
            }
        }

        self.entries.clear();
        report
    }
}
