//! 译文对齐
//!
//! 把模型返回的一整段文本拆回与输入一一对应的译文，依次尝试：
//!
//! 1. 按保留分隔符 `|||` 切分，数量一致则直接采用（逐项去除首尾空白）
//! 2. 按编号前缀（`1. `、`2) ` ...）切分，数量一致则采用
//! 3. 都不一致时原样返回输入文本，由调用方发出警告

use std::sync::OnceLock;

use regex::Regex;

/// 采用的对齐方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Delimited,
    Enumerated,
    /// 两种解析的数量都不匹配，`received` 为分隔符切分得到的数量
    Fallback { received: usize },
}

impl Reconciliation {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Reconciliation::Fallback { .. })
    }
}

/// 对齐结果，`translations.len()` 总是等于输入数量
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub translations: Vec<String>,
    pub method: Reconciliation,
}

fn enumeration_regex() -> Option<&'static Regex> {
    static ENUMERATION: OnceLock<Option<Regex>> = OnceLock::new();
    ENUMERATION
        .get_or_init(|| Regex::new(r"^\s*\d+[.)]\s*(.*)$").ok())
        .as_ref()
}

/// 按分隔符切分，去掉首尾的空段
pub fn split_delimited(raw: &str, delimiter: &str) -> Vec<String> {
    let mut parts: Vec<String> = raw.split(delimiter).map(|s| s.trim().to_string()).collect();

    while parts.last().is_some_and(|s| s.is_empty()) {
        parts.pop();
    }
    while parts.first().is_some_and(|s| s.is_empty()) {
        parts.remove(0);
    }

    parts
}

/// 按编号前缀切分
///
/// 带编号的行开启新条目，不带编号的非空行作为上一条目的续行；
/// 第一个编号之前的内容（例如模型的开场白）被忽略。
pub fn split_enumerated(raw: &str) -> Vec<String> {
    let Some(regex) = enumeration_regex() else {
        return Vec::new();
    };
    let mut items: Vec<String> = Vec::new();

    for line in raw.lines() {
        if let Some(captures) = regex.captures(line) {
            let text = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            items.push(text.trim().to_string());
        } else if let Some(current) = items.last_mut() {
            let line = line.trim();
            if !line.is_empty() {
                if !current.is_empty() {
                    current.push('\n');
                }
                current.push_str(line);
            }
        }
    }

    items
}

/// 对齐模型回复与输入文本
pub fn reconcile(raw: &str, sources: &[String], delimiter: &str) -> Reconciled {
    let expected = sources.len();

    let delimited = split_delimited(raw, delimiter);
    if delimited.len() == expected {
        return Reconciled {
            translations: delimited,
            method: Reconciliation::Delimited,
        };
    }

    let enumerated = split_enumerated(raw);
    if enumerated.len() == expected {
        return Reconciled {
            translations: enumerated,
            method: Reconciliation::Enumerated,
        };
    }

    Reconciled {
        translations: sources.to_vec(),
        method: Reconciliation::Fallback {
            received: delimited.len(),
        },
    }
}
