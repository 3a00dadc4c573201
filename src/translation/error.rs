//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制

use std::fmt;

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 配置错误
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// 网络错误
    #[error("network error: {0}")]
    NetworkError(String),

    /// 接口返回非 2xx 或错误信封
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// 解析错误（响应信封无法解析）
    #[error("parse error: {0}")]
    ParseError(String),

    /// 文本收集错误
    #[error("text selection failed: {0}")]
    SelectionError(String),

    /// 批次处理错误
    #[error("batching failed: {0}")]
    BatchingError(String),

    /// 已有翻译任务在运行
    #[error("a translation run is already in progress")]
    AlreadyRunning,

    /// 输入验证错误
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 内部错误
    #[error("internal error: {0}")]
    InternalError(String),
}

impl TranslationError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::NetworkError(_) => true,
            TranslationError::ApiError { .. } => true,
            TranslationError::ParseError(_) => true,
            TranslationError::ConfigError(_) => false,
            TranslationError::SelectionError(_) => false,
            TranslationError::BatchingError(_) => false,
            TranslationError::AlreadyRunning => false,
            TranslationError::InvalidInput(_) => false,
            TranslationError::InternalError(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::NetworkError(_) => ErrorSeverity::Warning,
            TranslationError::ApiError { .. } => ErrorSeverity::Warning,
            TranslationError::ParseError(_) => ErrorSeverity::Error,
            TranslationError::SelectionError(_) => ErrorSeverity::Critical,
            TranslationError::BatchingError(_) => ErrorSeverity::Critical,
            TranslationError::AlreadyRunning => ErrorSeverity::Info,
            TranslationError::InvalidInput(_) => ErrorSeverity::Info,
            TranslationError::InternalError(_) => ErrorSeverity::Critical,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::NetworkError(_) => ErrorCategory::Network,
            TranslationError::ApiError { .. } => ErrorCategory::Service,
            TranslationError::ParseError(_) => ErrorCategory::Parsing,
            TranslationError::SelectionError(_) => ErrorCategory::Processing,
            TranslationError::BatchingError(_) => ErrorCategory::Processing,
            TranslationError::AlreadyRunning => ErrorCategory::Concurrency,
            TranslationError::InvalidInput(_) => ErrorCategory::Input,
            TranslationError::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// 运行级致命错误：只有结构性失败（无法收集文本、无法分批）会中止整页翻译
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            TranslationError::SelectionError(_)
                | TranslationError::BatchingError(_)
                | TranslationError::InternalError(_)
        )
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        let wrap = |msg: String| format!("{} (context: {})", msg, context);

        match self {
            TranslationError::ConfigError(msg) => TranslationError::ConfigError(wrap(msg)),
            TranslationError::NetworkError(msg) => TranslationError::NetworkError(wrap(msg)),
            TranslationError::ApiError { status, message } => TranslationError::ApiError {
                status,
                message: wrap(message),
            },
            TranslationError::ParseError(msg) => TranslationError::ParseError(wrap(msg)),
            TranslationError::SelectionError(msg) => TranslationError::SelectionError(wrap(msg)),
            TranslationError::BatchingError(msg) => TranslationError::BatchingError(wrap(msg)),
            TranslationError::InvalidInput(msg) => TranslationError::InvalidInput(wrap(msg)),
            TranslationError::InternalError(msg) => TranslationError::InternalError(wrap(msg)),
            TranslationError::AlreadyRunning => TranslationError::AlreadyRunning,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Service,
    Parsing,
    Processing,
    Concurrency,
    Input,
    Internal,
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            TranslationError::ParseError(format!("invalid response body: {}", error))
        } else if let Some(status) = error.status() {
            TranslationError::ApiError {
                status: status.as_u16(),
                message: error.to_string(),
            }
        } else {
            TranslationError::NetworkError(error.to_string())
        }
    }
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::InternalError(format!("I/O error: {}", error))
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::ParseError(format!("JSON error: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ConfigError(format!("TOML error: {}", error))
    }
}

impl From<crate::env::EnvError> for TranslationError {
    fn from(error: crate::env::EnvError) -> Self {
        TranslationError::ConfigError(error.to_string())
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误
    pub fn log_error(error: &TranslationError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("translation: {}", error),
            ErrorSeverity::Warning => tracing::warn!("translation: {}", error),
            ErrorSeverity::Error => tracing::error!("translation: {}", error),
            ErrorSeverity::Critical => tracing::error!("translation (critical): {}", error),
        }
    }

    /// 创建输入验证错误
    pub fn validation_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::InvalidInput(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_retryable() {
        assert!(TranslationError::NetworkError("reset".into()).is_retryable());
        assert!(TranslationError::ApiError {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
        assert!(!TranslationError::ConfigError("bad".into()).is_retryable());
        assert!(!TranslationError::AlreadyRunning.is_retryable());
    }

    #[test]
    fn only_structural_errors_are_fatal() {
        assert!(TranslationError::SelectionError("x".into()).is_run_fatal());
        assert!(TranslationError::BatchingError("x".into()).is_run_fatal());
        assert!(!TranslationError::NetworkError("x".into()).is_run_fatal());
    }

    #[test]
    fn context_is_appended_to_message() {
        let err = TranslationError::NetworkError("timeout".into()).with_context("batch 3");
        assert_eq!(err.to_string(), "network error: timeout (context: batch 3)");

        let err = TranslationError::AlreadyRunning.with_context("ignored");
        assert!(matches!(err, TranslationError::AlreadyRunning));
    }

    #[test]
    fn display_never_contains_debug_output() {
        let err = TranslationError::ApiError {
            status: 401,
            message: "Incorrect API key provided".into(),
        };
        assert_eq!(err.to_string(), "API error (401): Incorrect API key provided");
    }
}
