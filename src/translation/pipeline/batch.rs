//! 翻译批次管理器模块
//!
//! 把按文档顺序排列的文本单元贪心地切分成有界批次：
//! 当前批次加入下一个单元会超出阈值时就关闭并开启新批次，最后的不满批次总会输出。
//!
//! 两种阈值策略：
//!
//! - `MaxChars(n)`: 批次内源文本累计字符数不超过 `n`（默认 2000）
//! - `MaxItems(n)`: 批次内单元数不超过 `n`（默认 10）
//!
//! 单个单元自身就超过阈值时独占一个批次，不会被拆分。

use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::pipeline::collector::TextUnit;

/// 分批策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPolicy {
    /// 每批最多条目数
    MaxItems(usize),
    /// 每批最多累计字符数
    MaxChars(usize),
}

impl BatchPolicy {
    fn limit(&self) -> usize {
        match *self {
            BatchPolicy::MaxItems(n) | BatchPolicy::MaxChars(n) => n,
        }
    }

    /// 单元在该策略下的尺寸
    fn unit_size(&self, unit: &TextUnit) -> usize {
        match self {
            BatchPolicy::MaxItems(_) => 1,
            BatchPolicy::MaxChars(_) => unit.char_count(),
        }
    }
}

impl Default for BatchPolicy {
    fn default() -> Self {
        BatchPolicy::MaxChars(crate::translation::config::constants::DEFAULT_BATCH_MAX_CHARS)
    }
}

/// 翻译批次
#[derive(Debug, Clone)]
pub struct Batch {
    /// 批次序号
    pub id: usize,
    /// 包含的文本单元，保持文档顺序
    pub units: Vec<TextUnit>,
    /// 源文本累计字符数
    pub total_chars: usize,
}

impl Batch {
    pub fn new(id: usize, units: Vec<TextUnit>) -> Self {
        let total_chars = units.iter().map(|unit| unit.char_count()).sum();
        Self {
            id,
            units,
            total_chars,
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// 按顺序取出源文本
    pub fn source_texts(&self) -> Vec<String> {
        self.units.iter().map(|unit| unit.source.clone()).collect()
    }
}

/// 批次统计
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    pub input_items: usize,
    pub output_batches: usize,
    /// 单个单元超过阈值而独占的批次数
    pub oversized_batches: usize,
}

/// 批次管理器
pub struct BatchManager {
    policy: BatchPolicy,
    stats: BatchStats,
}

impl BatchManager {
    pub fn new(policy: BatchPolicy) -> Self {
        Self {
            policy,
            stats: BatchStats::default(),
        }
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    /// 创建批次
    pub fn create_batches(&mut self, units: Vec<TextUnit>) -> TranslationResult<Vec<Batch>> {
        let limit = self.policy.limit();
        if limit == 0 {
            return Err(TranslationError::BatchingError(format!(
                "batch limit must be greater than 0 ({:?})",
                self.policy
            )));
        }

        self.stats = BatchStats {
            input_items: units.len(),
            ..Default::default()
        };

        let mut batches = Vec::new();
        let mut current: Vec<TextUnit> = Vec::new();
        let mut current_size = 0;

        for unit in units {
            let size = self.policy.unit_size(&unit);

            if !current.is_empty() && current_size + size > limit {
                self.push_batch(&mut batches, std::mem::take(&mut current), current_size);
                current_size = 0;
            }

            current_size += size;
            current.push(unit);
        }

        if !current.is_empty() {
            self.push_batch(&mut batches, current, current_size);
        }

        tracing::debug!(
            "split {} text units into {} batches using {:?}",
            self.stats.input_items,
            batches.len(),
            self.policy
        );

        Ok(batches)
    }

    fn push_batch(&mut self, batches: &mut Vec<Batch>, units: Vec<TextUnit>, size: usize) {
        if units.len() == 1 && size > self.policy.limit() {
            self.stats.oversized_batches += 1;
        }
        batches.push(Batch::new(batches.len(), units));
        self.stats.output_batches += 1;
    }

    pub fn get_stats(&self) -> &BatchStats {
        &self.stats
    }
}

impl Default for BatchManager {
    fn default() -> Self {
        Self::new(BatchPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::html_to_dom;
    use crate::translation::pipeline::collector::TextCollector;

    fn units(texts: &[&str]) -> Vec<TextUnit> {
        let body: String = texts.iter().map(|t| format!("<p>{}</p>", t)).collect();
        let html = format!("<html><body>{}</body></html>", body);
        let dom = html_to_dom(html.as_bytes(), "utf-8").unwrap();
        TextCollector::default()
            .collect_translatable_texts(&dom.document)
            .unwrap()
    }

    fn flatten(batches: &[Batch]) -> Vec<String> {
        batches
            .iter()
            .flat_map(|b| b.units.iter().map(|u| u.source.clone()))
            .collect()
    }

    #[test]
    fn splits_by_item_count() {
        let input = units(&["one", "two", "three", "four", "five"]);
        let mut manager = BatchManager::new(BatchPolicy::MaxItems(2));
        let batches = manager.create_batches(input).unwrap();

        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(flatten(&batches), vec!["one", "two", "three", "four", "five"]);
        assert_eq!(manager.get_stats().output_batches, 3);
    }

    #[test]
    fn splits_by_character_budget() {
        // 5 + 5 + 5 字符，阈值 10
        let input = units(&["aaaaa", "bbbbb", "ccccc"]);
        let mut manager = BatchManager::new(BatchPolicy::MaxChars(10));
        let batches = manager.create_batches(input).unwrap();

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].total_chars, 10);
        assert_eq!(batches[1].total_chars, 5);
        assert!(batches.iter().all(|b| b.total_chars <= 10));
    }

    #[test]
    fn oversized_unit_gets_its_own_batch() {
        let input = units(&["short", "a much longer paragraph", "tail"]);
        let mut manager = BatchManager::new(BatchPolicy::MaxChars(8));
        let batches = manager.create_batches(input).unwrap();

        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![1, 1, 1]);
        assert_eq!(manager.get_stats().oversized_batches, 1);
        assert_eq!(flatten(&batches), vec!["short", "a much longer paragraph", "tail"]);
    }

    #[test]
    fn empty_input_yields_no_batches() {
        let mut manager = BatchManager::default();
        assert!(manager.create_batches(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn zero_limit_is_a_batching_error() {
        let mut manager = BatchManager::new(BatchPolicy::MaxItems(0));
        assert!(matches!(
            manager.create_batches(units(&["hello"])),
            Err(TranslationError::BatchingError(_))
        ));
    }

    #[test]
    fn batch_ids_follow_order() {
        let input = units(&["one", "two", "three"]);
        let batches = BatchManager::new(BatchPolicy::MaxItems(1))
            .create_batches(input)
            .unwrap();
        let ids: Vec<usize> = batches.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
