//! 文本过滤器模块
//!
//! 判断一段文本是否值得送去翻译：去掉首尾空白后长度达到阈值，
//! 并且至少包含一段连续两个以上的字母（覆盖全部 Unicode 字母区间）。

use std::sync::OnceLock;

use regex::Regex;

use crate::translation::config::constants;

/// 文本过滤器
pub struct TextFilter {
    /// 去除首尾空白后的最小字符数
    min_length: usize,
    regex_cache: RegexCache,
}

/// 正则表达式缓存
#[derive(Default)]
struct RegexCache {
    letter_run_regex: OnceLock<Option<Regex>>,
}

impl TextFilter {
    /// 创建新的文本过滤器
    pub fn new() -> Self {
        Self::with_min_length(constants::MIN_TEXT_LENGTH)
    }

    pub fn with_min_length(min_length: usize) -> Self {
        Self {
            min_length,
            regex_cache: RegexCache::default(),
        }
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// 判断文本是否需要翻译
    pub fn should_translate(&self, text: &str) -> bool {
        let trimmed = text.trim();

        if trimmed.chars().count() < self.min_length {
            return false;
        }

        self.has_letter_run(trimmed)
    }

    /// 是否包含至少 `MIN_LETTER_RUN` 个连续字母
    pub fn has_letter_run(&self, text: &str) -> bool {
        let regex = self.regex_cache.letter_run_regex.get_or_init(|| {
            Regex::new(&format!(r"\p{{L}}{{{},}}", constants::MIN_LETTER_RUN)).ok()
        });

        match regex {
            Some(regex) => regex.is_match(text),
            None => Self::scan_letter_run(text),
        }
    }

    fn scan_letter_run(text: &str) -> bool {
        let mut run = 0;
        for c in text.chars() {
            if c.is_alphabetic() {
                run += 1;
                if run >= constants::MIN_LETTER_RUN {
                    return true;
                }
            } else {
                run = 0;
            }
        }
        false
    }
}

impl Default for TextFilter {
    fn default() -> Self {
        Self::new()
    }
}
