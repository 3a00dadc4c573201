//! 控制端消息
//!
//! 入站请求与应答的 JSON 形状，字段名沿用控制端的驼峰写法。

use serde::{Deserialize, Serialize};

use crate::translation::stats::PageStats;

/// 宿主保存的用户设置，核心只读取
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub api_key: String,
    pub target_language: String,
    pub auto_translate: bool,
}

impl Settings {
    /// 是否满足自动翻译条件
    pub fn auto_translate_enabled(&self) -> bool {
        self.auto_translate && !self.api_key.trim().is_empty()
    }
}

/// 入站请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    #[serde(alias = "translatePage", rename_all = "camelCase")]
    Translate {
        api_key: String,
        target_language: String,
    },
    Restore,
    GetStatus,
    #[serde(rename_all = "camelCase")]
    TranslateSelection {
        api_key: String,
        target_language: String,
        text: String,
    },
    AutoTranslateCheck,
}

/// 应答
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Translated {
        success: bool,
        stats: PageStats,
    },
    Translation {
        success: bool,
        translation: String,
    },
    #[serde(rename_all = "camelCase")]
    Status {
        is_translating: bool,
        progress: u8,
        message: String,
    },
    Error {
        error: String,
    },
    Skipped {
        success: bool,
        reason: String,
    },
    Ok {
        success: bool,
    },
}

impl Response {
    pub fn ok() -> Self {
        Response::Ok { success: true }
    }

    pub fn translated(stats: PageStats) -> Self {
        Response::Translated {
            success: true,
            stats,
        }
    }

    pub fn translation(text: impl Into<String>) -> Self {
        Response::Translation {
            success: true,
            translation: text.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            error: message.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Response::Skipped {
            success: false,
            reason: reason.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }
}
