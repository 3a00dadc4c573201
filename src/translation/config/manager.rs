//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::pipeline::batch::BatchPolicy;

/// 批次划分方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// 按累计字符数
    Chars,
    /// 按条目数
    Items,
}

/// 翻译配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 接口配置
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub target_lang: String,
    pub request_timeout_secs: u64,

    // 批次配置
    pub batch_mode: BatchMode,
    pub batch_max_chars: usize,
    pub batch_max_items: usize,
    pub batch_delay_ms: u64,

    // 过滤配置
    pub min_text_length: usize,

    // 重试配置
    pub max_retries: usize,
    pub retry_delay_ms: u64,

    // 缓存配置
    pub cache_enabled: bool,
    pub cache_capacity: usize,

    // 动态内容观察
    pub observer_debounce_ms: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.to_string(),
            model: constants::DEFAULT_MODEL.to_string(),
            temperature: constants::DEFAULT_TEMPERATURE,
            target_lang: constants::DEFAULT_TARGET_LANG.to_string(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),

            batch_mode: BatchMode::Chars,
            batch_max_chars: constants::DEFAULT_BATCH_MAX_CHARS,
            batch_max_items: constants::DEFAULT_BATCH_MAX_ITEMS,
            batch_delay_ms: constants::BATCH_DELAY.as_millis() as u64,

            min_text_length: constants::MIN_TEXT_LENGTH,

            max_retries: constants::DEFAULT_MAX_RETRIES,
            retry_delay_ms: constants::DEFAULT_RETRY_DELAY.as_millis() as u64,

            cache_enabled: true,
            cache_capacity: constants::DEFAULT_CACHE_CAPACITY,

            observer_debounce_ms: constants::DEFAULT_OBSERVER_DEBOUNCE.as_millis() as u64,
        }
    }
}

impl TranslationConfig {
    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        url::Url::parse(&self.api_url).map_err(|e| {
            TranslationError::ConfigError(format!("invalid api_url '{}': {}", self.api_url, e))
        })?;

        if self.model.trim().is_empty() {
            return Err(TranslationError::ConfigError("model must not be empty".to_string()));
        }

        if self.target_lang.trim().is_empty() {
            return Err(TranslationError::ConfigError(
                "target_lang must not be empty".to_string(),
            ));
        }

        match self.batch_mode {
            BatchMode::Chars if self.batch_max_chars == 0 => {
                return Err(TranslationError::ConfigError(
                    "batch_max_chars must be greater than 0".to_string(),
                ));
            }
            BatchMode::Items if self.batch_max_items == 0 => {
                return Err(TranslationError::ConfigError(
                    "batch_max_items must be greater than 0".to_string(),
                ));
            }
            _ => {}
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(TranslationError::ConfigError(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.cache_enabled && self.cache_capacity == 0 {
            return Err(TranslationError::ConfigError(
                "cache_capacity must be greater than 0 when the cache is enabled".to_string(),
            ));
        }

        Ok(())
    }

    /// 应用环境变量覆盖，只有已设置的变量才会覆盖文件中的值
    pub fn apply_env_overrides(&mut self) -> TranslationResult<()> {
        use crate::env::{cache, translation, EnvVar};

        if let Some(target_lang) = translation::TargetLang::lookup()? {
            self.target_lang = target_lang;
        }

        if let Some(api_url) = translation::ApiUrl::lookup()? {
            self.api_url = api_url;
            tracing::info!("API URL overridden from environment: {}", self.api_url);
        }

        if let Some(model) = translation::Model::lookup()? {
            self.model = model;
        }

        if let Some(max_chars) = translation::BatchMaxChars::lookup()? {
            self.batch_max_chars = max_chars;
        }

        if let Some(max_items) = translation::BatchMaxItems::lookup()? {
            self.batch_max_items = max_items;
        }

        if let Some(retries) = translation::MaxRetries::lookup()? {
            self.max_retries = retries;
        }

        if let Some(delay) = translation::RetryDelay::lookup()? {
            self.retry_delay_ms = delay.as_millis() as u64;
        }

        if let Some(delay) = translation::BatchDelay::lookup()? {
            self.batch_delay_ms = delay.as_millis() as u64;
        }

        if let Some(enabled) = cache::Enabled::lookup()? {
            self.cache_enabled = enabled;
        }

        if let Some(capacity) = cache::Capacity::lookup()? {
            self.cache_capacity = capacity;
        }

        Ok(())
    }

    /// 当前配置对应的分批策略
    pub fn batch_policy(&self) -> BatchPolicy {
        match self.batch_mode {
            BatchMode::Chars => BatchPolicy::MaxChars(self.batch_max_chars),
            BatchMode::Items => BatchPolicy::MaxItems(self.batch_max_items),
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn observer_debounce(&self) -> Duration {
        Duration::from_millis(self.observer_debounce_ms)
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
}

impl ConfigManager {
    /// 按搜索路径加载配置，叠加环境变量并校验
    pub fn new() -> TranslationResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(Self { config })
    }

    /// 从指定文件加载配置
    pub fn from_file(path: &str) -> TranslationResult<Self> {
        Self::load_dotenv();
        let expanded = shellexpand::tilde(path);
        let mut config = Self::load_from_file(&expanded)?;
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn into_config(self) -> TranslationConfig {
        self.config
    }

    fn load_config() -> TranslationResult<TranslationConfig> {
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("loading configuration file: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::debug!("no configuration file found, using defaults");
        Ok(TranslationConfig::default())
    }

    fn load_from_file(path: &str) -> TranslationResult<TranslationConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TranslationError::ConfigError(format!("failed to read config file {}: {}", path, e))
        })?;

        Self::parse_config(path, &content)
    }

    /// 根据扩展名解析 TOML 或 JSON 配置
    pub fn parse_config(path: &str, content: &str) -> TranslationResult<TranslationConfig> {
        if path.ends_with(".json") {
            serde_json::from_str(content).map_err(|e| {
                TranslationError::ConfigError(format!("failed to parse JSON config: {}", e))
            })
        } else {
            toml::from_str(content).map_err(|e| {
                TranslationError::ConfigError(format!("failed to parse TOML config: {}", e))
            })
        }
    }

    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("loaded environment file: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = TranslationConfig::default();
        let content = toml::to_string_pretty(&config).map_err(|e| {
            TranslationError::ConfigError(format!("failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content).map_err(|e| {
            TranslationError::ConfigError(format!("failed to write config file: {}", e))
        })?;

        Ok(())
    }
}
