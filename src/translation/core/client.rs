//! 翻译客户端
//!
//! 把一批源文本合并成一次 chat-completion 请求发给远端接口，再把回复拆回逐条译文。
//!
//! ## 工作流程
//! 1. 查询批次缓存（键为目标语言 + 整批源文本），命中则不发请求
//! 2. 用保留分隔符 `|||` 连接源文本，构造请求
//! 3. 网络错误、非 2xx、响应信封无法解析时按固定间隔重试
//! 4. 成功后按 [`reconcile`](super::reconcile::reconcile) 对齐译文；只有对齐成功的批次才写入缓存

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use super::reconcile::{reconcile, Reconciliation};
use crate::translation::config::{constants, TranslationConfig};
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::storage::cache::{CacheConfig, TranslationCache};

/// 客户端配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    /// 首次请求失败后的重试次数
    pub max_retries: usize,
    /// 两次尝试之间的固定间隔
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    pub delimiter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from(&TranslationConfig::default())
    }
}

impl From<&TranslationConfig> for ClientConfig {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
            request_timeout: config.request_timeout(),
            delimiter: constants::DELIMITER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

/// 一批文本的翻译结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTranslation {
    /// 与输入逐项对应的译文，长度总是等于输入数量
    pub translations: Vec<String>,
    pub method: Reconciliation,
    pub from_cache: bool,
}

/// 客户端统计（原子计数）
#[derive(Debug, Default)]
pub struct ClientStats {
    pub requests_sent: AtomicUsize,
    pub retries: AtomicUsize,
    pub failed_batches: AtomicUsize,
    pub cache_hits: AtomicUsize,
    pub fallbacks: AtomicUsize,
}

impl ClientStats {
    pub fn requests_sent(&self) -> usize {
        self.requests_sent.load(Ordering::Relaxed)
    }

    pub fn retries(&self) -> usize {
        self.retries.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn fallbacks(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }
}

/// chat-completion 翻译客户端
pub struct TranslationClient {
    http: reqwest::Client,
    config: ClientConfig,
    cache: TranslationCache,
    stats: ClientStats,
}

impl TranslationClient {
    pub fn new(config: ClientConfig, cache: TranslationCache) -> TranslationResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                TranslationError::ConfigError(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            config,
            cache,
            stats: ClientStats::default(),
        })
    }

    pub fn from_config(config: &TranslationConfig) -> TranslationResult<Self> {
        let cache = TranslationCache::new(CacheConfig {
            enabled: config.cache_enabled,
            capacity: config.cache_capacity,
        });
        Self::new(ClientConfig::from(config), cache)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn get_stats(&self) -> &ClientStats {
        &self.stats
    }

    /// 翻译一批文本
    ///
    /// 成功时每个下标的译文对应同一下标的输入；对齐失败时原样返回输入并标记为
    /// [`Reconciliation::Fallback`]。重试耗尽后返回错误，由编排器决定跳过该批次。
    pub async fn translate_batch(
        &self,
        api_key: &str,
        texts: &[String],
        target_lang: &str,
    ) -> TranslationResult<BatchTranslation> {
        if texts.is_empty() {
            return Ok(BatchTranslation {
                translations: Vec::new(),
                method: Reconciliation::Delimited,
                from_cache: false,
            });
        }

        if let Some(cached) = self.cache.get(texts, target_lang) {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("cache hit for batch of {} texts", texts.len());
            return Ok(BatchTranslation {
                translations: cached,
                method: Reconciliation::Delimited,
                from_cache: true,
            });
        }

        let raw = match self.request_with_retry(api_key, texts, target_lang).await {
            Ok(raw) => raw,
            Err(e) => {
                self.stats.failed_batches.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };

        let reconciled = reconcile(&raw, texts, &self.config.delimiter);

        match reconciled.method {
            Reconciliation::Fallback { received } => {
                self.stats.fallbacks.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    "translation count mismatch: expected {}, received {}; keeping original text",
                    texts.len(),
                    received
                );
            }
            method => {
                tracing::debug!("reconciled {} translations ({:?})", texts.len(), method);
                self.cache
                    .insert(texts, target_lang, reconciled.translations.clone());
            }
        }

        Ok(BatchTranslation {
            translations: reconciled.translations,
            method: reconciled.method,
            from_cache: false,
        })
    }

    /// 翻译单条文本（例如页面上选中的文字）
    pub async fn translate_text(
        &self,
        api_key: &str,
        text: &str,
        target_lang: &str,
    ) -> TranslationResult<String> {
        let texts = vec![text.trim().to_string()];
        let mut result = self.translate_batch(api_key, &texts, target_lang).await?;
        Ok(result.translations.pop().unwrap_or_default())
    }

    /// 构造请求消息
    pub fn build_messages(&self, texts: &[String], target_lang: &str) -> Vec<ChatMessage> {
        let delimiter = &self.config.delimiter;
        let instruction = format!(
            "You are a translation engine. Translate each text segment into {lang}. \
             Segments are separated by the token {delim}. Reply with the translations only, \
             in the same order, separated by {delim}. Never merge, split, number or omit segments.",
            lang = target_lang,
            delim = delimiter
        );

        vec![
            ChatMessage {
                role: "system".to_string(),
                content: instruction,
            },
            ChatMessage {
                role: "user".to_string(),
                content: texts.join(&format!("\n{}\n", delimiter)),
            },
        ]
    }

    async fn request_with_retry(
        &self,
        api_key: &str,
        texts: &[String],
        target_lang: &str,
    ) -> TranslationResult<String> {
        let max_attempts = self.config.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.request_once(api_key, texts, target_lang).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    self.stats.retries.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        "translation request failed, retrying in {}ms (attempt {}/{}): {}",
                        self.config.retry_delay.as_millis(),
                        attempt + 1,
                        max_attempts,
                        e
                    );
                    sleep(self.config.retry_delay).await;
                }
                Err(e) => {
                    return Err(if attempt > 1 {
                        e.with_context(format!("gave up after {} attempts", attempt))
                    } else {
                        e
                    });
                }
            }
        }
    }

    async fn request_once(
        &self,
        api_key: &str,
        texts: &[String],
        target_lang: &str,
    ) -> TranslationResult<String> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: self.build_messages(texts, target_lang),
            temperature: self.config.temperature,
        };

        self.stats.requests_sent.fetch_add(1, Ordering::Relaxed);

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| text.chars().take(200).collect());
            return Err(TranslationError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text)?;

        if let Some(error) = parsed.error {
            return Err(TranslationError::ApiError {
                status: status.as_u16(),
                message: error.message,
            });
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TranslationError::ParseError("response contained no content".to_string()))
    }
}
