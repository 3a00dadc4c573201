//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

pub use manager::{BatchMode, ConfigManager, TranslationConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 批次处理相关
    pub const DEFAULT_BATCH_MAX_CHARS: usize = 2000;
    pub const DEFAULT_BATCH_MAX_ITEMS: usize = 10;
    pub const BATCH_DELAY: Duration = Duration::from_millis(200);

    // 文本过滤相关
    pub const MIN_TEXT_LENGTH: usize = 2;
    pub const MIN_LETTER_RUN: usize = 2;

    // 协议相关
    pub const DELIMITER: &str = "|||";
    pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
    pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
    pub const DEFAULT_TEMPERATURE: f32 = 0.3;
    pub const DEFAULT_TARGET_LANG: &str = "Chinese";
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    // 重试策略
    pub const DEFAULT_MAX_RETRIES: usize = 2;
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

    // 缓存设置
    pub const DEFAULT_CACHE_CAPACITY: usize = 500;

    // 动态内容观察
    pub const DEFAULT_OBSERVER_DEBOUNCE: Duration = Duration::from_millis(1000);

    // 进度分配（百分比）
    pub const PROGRESS_HEAD: u8 = 10;
    pub const PROGRESS_TAIL: u8 = 10;

    // 页面级标记属性
    pub const TRANSLATED_MARKER_ATTR: &str = "data-translated";

    // 不可见或非语言内容元素
    pub const SKIP_ELEMENTS: &[&str] = &[
        "script", "style", "noscript", "iframe", "object", "embed", "template",
    ];

    // 可编辑输入元素
    pub const EDITABLE_ELEMENTS: &[&str] = &["textarea", "input", "select"];

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "page-translator.toml",
        ".page-translator.toml",
        "~/.config/page-translator/config.toml",
        "/etc/page-translator/config.toml",
    ];
}
