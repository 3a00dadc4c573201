//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问，所有变量都以 `PAGE_TRANSLATOR_` 开头，
//! API 密钥额外兼容通用的 `OPENAI_API_KEY`。

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 仅在变量已设置时返回解析结果；未设置返回 `None`，不回落到默认值
    fn lookup() -> EnvResult<Option<T>> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value).map(Some),
            Err(_) => Ok(None),
        }
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "PAGE_TRANSLATOR_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 翻译相关环境变量
pub mod translation {
    use super::*;

    /// 目标语言，允许自然语言名称（例如 "Spanish"）或语言代码
    pub struct TargetLang;
    impl EnvVar<String> for TargetLang {
        const NAME: &'static str = "PAGE_TRANSLATOR_TARGET_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Target language for translation";

        fn parse(value: &str) -> EnvResult<String> {
            let lang = value.trim();
            if lang.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Target language must not be empty".to_string(),
                });
            }
            Ok(lang.to_string())
        }
    }

    /// API URL
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "PAGE_TRANSLATOR_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Chat-completion endpoint URL";

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API URL must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// API 密钥
    pub struct ApiKey;
    impl EnvVar<String> for ApiKey {
        const NAME: &'static str = "PAGE_TRANSLATOR_API_KEY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Bearer credential for the chat-completion API";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME).or_else(|_| env::var("OPENAI_API_KEY")) {
                Ok(value) => Self::parse(&value),
                Err(_) => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Required environment variable not set".to_string(),
                }),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let key = value.trim();
            if key.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API key must not be empty".to_string(),
                });
            }
            Ok(key.to_string())
        }
    }

    /// 模型名称
    pub struct Model;
    impl EnvVar<String> for Model {
        const NAME: &'static str = "PAGE_TRANSLATOR_MODEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Model identifier sent with each request";

        fn parse(value: &str) -> EnvResult<String> {
            Ok(value.trim().to_string())
        }
    }

    /// 单批次最大字符数
    pub struct BatchMaxChars;
    impl EnvVar<usize> for BatchMaxChars {
        const NAME: &'static str = "PAGE_TRANSLATOR_BATCH_MAX_CHARS";
        const DEFAULT: Option<usize> = Some(2000);
        const DESCRIPTION: &'static str = "Maximum cumulative characters per batch";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 100_000)
        }
    }

    /// 单批次最大条目数
    pub struct BatchMaxItems;
    impl EnvVar<usize> for BatchMaxItems {
        const NAME: &'static str = "PAGE_TRANSLATOR_BATCH_MAX_ITEMS";
        const DEFAULT: Option<usize> = Some(10);
        const DESCRIPTION: &'static str = "Maximum number of text items per batch";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 1000)
        }
    }

    /// 最大重试次数
    pub struct MaxRetries;
    impl EnvVar<usize> for MaxRetries {
        const NAME: &'static str = "PAGE_TRANSLATOR_MAX_RETRIES";
        const DEFAULT: Option<usize> = Some(2);
        const DESCRIPTION: &'static str = "Retries after a failed request";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 0, 10)
        }
    }

    /// 重试间隔
    pub struct RetryDelay;
    impl EnvVar<Duration> for RetryDelay {
        const NAME: &'static str = "PAGE_TRANSLATOR_RETRY_DELAY_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(1000));
        const DESCRIPTION: &'static str = "Fixed delay between retries in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 60_000)
        }
    }

    /// 批次间隔
    pub struct BatchDelay;
    impl EnvVar<Duration> for BatchDelay {
        const NAME: &'static str = "PAGE_TRANSLATOR_BATCH_DELAY_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(200));
        const DESCRIPTION: &'static str = "Courtesy delay after each batch in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 10_000)
        }
    }
}

/// 缓存相关环境变量
pub mod cache {
    use super::*;

    /// 缓存启用状态
    pub struct Enabled;
    impl EnvVar<bool> for Enabled {
        const NAME: &'static str = "PAGE_TRANSLATOR_CACHE_ENABLED";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Enable the in-memory translation cache";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 缓存容量（批次条目数）
    pub struct Capacity;
    impl EnvVar<usize> for Capacity {
        const NAME: &'static str = "PAGE_TRANSLATOR_CACHE_CAPACITY";
        const DEFAULT: Option<usize> = Some(500);
        const DESCRIPTION: &'static str = "Cache capacity (number of batch entries)";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 100_000)
        }
    }
}

fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

fn parse_millis(value: &str, var_name: &str, max: u64) -> EnvResult<Duration> {
    let millis: u64 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid number of milliseconds".to_string(),
    })?;

    if millis > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Delay too long (maximum {} ms)", max),
        });
    }

    Ok(Duration::from_millis(millis))
}
