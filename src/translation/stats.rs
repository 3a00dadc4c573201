//! 运行统计与使用量统计

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 单次整页翻译的统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub target_lang: String,
    /// 改写节点的源文本词数之和
    pub words: usize,
    pub texts_collected: usize,
    pub texts_translated: usize,
    pub batches_total: usize,
    /// 重试耗尽后被跳过的批次
    pub batches_failed: usize,
    /// 对齐失败、保留原文的批次
    pub batches_fallback: usize,
    pub batches_cached: usize,
    pub page_translated: bool,
}

impl RunStats {
    pub fn new(target_lang: &str) -> Self {
        Self {
            target_lang: target_lang.to_string(),
            ..Default::default()
        }
    }

    pub fn pages(&self) -> u64 {
        u64::from(self.page_translated)
    }

    pub fn page_stats(&self) -> PageStats {
        PageStats {
            pages: self.pages(),
            words: self.words as u64,
        }
    }
}

/// 回报给控制端的结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStats {
    pub pages: u64,
    pub words: u64,
}

/// 累计使用量
///
/// 持久化由宿主负责，这里只负责按日期累加。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub pages_total: u64,
    pub words_today: u64,
    pub last_reset: NaiveDate,
}

impl UsageStats {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            pages_total: 0,
            words_today: 0,
            last_reset: today,
        }
    }

    /// 累加一次运行；日期变化时先清零当日词数
    pub fn record(&mut self, run: &RunStats, today: NaiveDate) {
        if self.last_reset != today {
            self.words_today = 0;
            self.last_reset = today;
        }
        self.pages_total += run.pages();
        self.words_today += run.words as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn run(words: usize) -> RunStats {
        RunStats {
            words,
            page_translated: true,
            ..RunStats::new("Spanish")
        }
    }

    #[test]
    fn accumulates_within_a_day() {
        let mut usage = UsageStats::new(date(1));
        usage.record(&run(10), date(1));
        usage.record(&run(5), date(1));

        assert_eq!(usage.pages_total, 2);
        assert_eq!(usage.words_today, 15);
    }

    #[test]
    fn resets_daily_words_on_new_day() {
        let mut usage = UsageStats::new(date(1));
        usage.record(&run(10), date(1));
        usage.record(&run(3), date(2));

        assert_eq!(usage.pages_total, 2);
        assert_eq!(usage.words_today, 3);
        assert_eq!(usage.last_reset, date(2));
    }

    #[test]
    fn untranslated_run_adds_no_page() {
        let mut usage = UsageStats::new(date(1));
        usage.record(&RunStats::new("Spanish"), date(1));
        assert_eq!(usage.pages_total, 0);
        assert_eq!(run(7).page_stats(), PageStats { pages: 1, words: 7 });
    }
}
