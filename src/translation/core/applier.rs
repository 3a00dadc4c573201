//! 译文回写
//!
//! 把对齐后的译文写回批次中各文本节点，并在第一次写入前备份原文。

use markup5ever_rcdom::Handle;

use crate::parsers::html::{find_nodes, get_text_content, set_node_attr, set_text_content};
use crate::translation::config::constants;
use crate::translation::pipeline::Batch;
use crate::translation::storage::{OriginalTextStore, RestoreReport};

/// 单个批次的回写结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// 实际改写的节点数
    pub applied: usize,
    /// 改写节点的源文本词数之和
    pub words: usize,
}

/// 把 `translated` 嵌回原文的首尾空白中
fn preserve_surrounding_whitespace(original: &str, translated: &str) -> String {
    let trimmed_start = original.trim_start();
    let leading = &original[..original.len() - trimmed_start.len()];
    let trailing = &trimmed_start[trimmed_start.trim_end().len()..];
    format!("{}{}{}", leading, translated.trim(), trailing)
}

/// 译文回写器
#[derive(Debug, Default, Clone, Copy)]
pub struct Applier;

impl Applier {
    pub fn new() -> Self {
        Self
    }

    /// 回写一个批次
    ///
    /// 只处理非空且与源文本不同的译文。两者长度不一致时按较短者截断，不会越界。
    pub fn apply(
        &self,
        batch: &Batch,
        translations: &[String],
        originals: &mut OriginalTextStore,
    ) -> ApplyReport {
        let mut report = ApplyReport::default();

        if translations.len() != batch.len() {
            tracing::warn!(
                "batch {} has {} units but {} translations",
                batch.id,
                batch.len(),
                translations.len()
            );
        }

        for (unit, translated) in batch.units.iter().zip(translations) {
            let translated = translated.trim();
            if translated.is_empty() || translated == unit.source {
                continue;
            }

            // 节点在收集之后可能已被改写，以当前内容为准
            let current = get_text_content(&unit.node).unwrap_or_else(|| unit.original.clone());
            originals.record(&unit.node, &current);

            if set_text_content(
                &unit.node,
                &preserve_surrounding_whitespace(&current, translated),
            ) {
                report.applied += 1;
                report.words += unit.word_count();
            }
        }

        report
    }

    /// 给页面打上已翻译标记
    pub fn mark_translated(&self, document: &Handle, target_lang: &str) {
        for html in find_nodes(document, &["html"]) {
            set_node_attr(
                &html,
                constants::TRANSLATED_MARKER_ATTR,
                Some(target_lang.to_string()),
            );
        }
    }

    /// 恢复全部原文并移除已翻译标记
    pub fn restore(&self, document: &Handle, originals: &mut OriginalTextStore) -> RestoreReport {
        let report = originals.restore_all();
        for html in find_nodes(document, &["html"]) {
            set_node_attr(&html, constants::TRANSLATED_MARKER_ATTR, None);
        }
        tracing::info!(
            "restored {} text nodes ({} no longer in document)",
            report.restored,
            report.skipped
        );
        report
    }
}
