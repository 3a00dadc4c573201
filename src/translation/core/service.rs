//! 翻译服务核心实现
//!
//! `TranslationService` 绑定一个已解析的页面，驱动整页翻译：
//!
//! ```text
//! Idle → Selecting → Batching → Translating(i/n) → Finalizing → Completed | Failed
//! ```
//!
//! 同一时间只允许一次运行。批次级失败（重试耗尽、对齐失败）只记录并继续，
//! 只有收集或分批阶段的结构性失败会让整次运行失败。
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use page_translator::parsers::html_to_dom;
//! use page_translator::translation::{RunOutcome, TranslationConfig, TranslationService};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let dom = html_to_dom(b"<html><body><p>Hello world</p></body></html>", "utf-8")?;
//! let service = TranslationService::new(TranslationConfig::default(), dom.document.clone())?;
//!
//! if let RunOutcome::Completed(stats) = service.translate_page("sk-...", "Spanish").await {
//!     println!("translated {} words", stats.words);
//! }
//! # Ok(())
//! # }
//! ```

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};

use markup5ever_rcdom::Handle;
use tokio::sync::broadcast;
use tokio::time::sleep;

use super::applier::Applier;
use super::client::TranslationClient;
use crate::parsers::html::find_nodes;
use crate::translation::config::{constants, TranslationConfig};
use crate::translation::error::{helpers, TranslationError, TranslationResult};
use crate::translation::events::{ProgressReporter, TranslationEvent};
use crate::translation::messages::{Request, Response, Settings};
use crate::translation::observer::{observe, DocumentObserver, MutationNotifier};
use crate::translation::pipeline::{BatchManager, BatchPolicy, CollectorConfig, TextCollector};
use crate::translation::stats::{PageStats, RunStats};
use crate::translation::storage::{OriginalTextStore, RestoreReport};

/// 运行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Selecting,
    Batching,
    Translating { current: usize, total: usize },
    Finalizing,
    Completed,
    Failed,
}

/// 一次运行的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunStats),
    /// 页面上没有可翻译文本
    NothingToTranslate,
    /// 已有运行在进行中，本次请求未改变任何状态
    AlreadyRunning,
    Failed(String),
}

impl RunOutcome {
    /// 转换为控制端应答
    pub fn into_response(self) -> Response {
        match self {
            RunOutcome::Completed(stats) => Response::translated(stats.page_stats()),
            RunOutcome::NothingToTranslate => Response::translated(PageStats::default()),
            RunOutcome::AlreadyRunning => {
                Response::error(TranslationError::AlreadyRunning.to_string())
            }
            RunOutcome::Failed(message) => Response::error(message),
        }
    }
}

/// 当前状态快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatus {
    pub phase: RunPhase,
    pub progress: u8,
    pub message: String,
}

impl Default for RunStatus {
    fn default() -> Self {
        Self {
            phase: RunPhase::Idle,
            progress: 0,
            message: String::new(),
        }
    }
}

/// 单次运行守卫标志
#[derive(Debug, Default)]
pub struct RunState {
    in_progress: AtomicBool,
}

impl RunState {
    /// 尝试开始一次运行；已在运行时返回 `None`
    pub fn try_begin(&self) -> Option<RunGuard<'_>> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard { state: self })
    }

    pub fn is_running(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }
}

/// 释放时清除运行标志
pub struct RunGuard<'a> {
    state: &'a RunState,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.in_progress.store(false, Ordering::Release);
    }
}

/// 整页翻译服务
pub struct TranslationService {
    config: TranslationConfig,
    document: Handle,
    client: TranslationClient,
    collector_config: CollectorConfig,
    batch_policy: BatchPolicy,
    applier: Applier,
    reporter: ProgressReporter,
    run_state: RunState,
    status: RefCell<RunStatus>,
    originals: RefCell<OriginalTextStore>,
    settings: RefCell<Option<Settings>>,
}

impl TranslationService {
    /// 为已解析的文档创建服务
    pub fn new(config: TranslationConfig, document: Handle) -> TranslationResult<Self> {
        config.validate()?;
        let client = TranslationClient::from_config(&config)?;
        Ok(Self::with_client(config, document, client))
    }

    pub fn with_client(
        config: TranslationConfig,
        document: Handle,
        client: TranslationClient,
    ) -> Self {
        let collector_config = CollectorConfig {
            min_text_length: config.min_text_length,
            ..Default::default()
        };
        let batch_policy = config.batch_policy();

        Self {
            config,
            document,
            client,
            collector_config,
            batch_policy,
            applier: Applier::new(),
            reporter: ProgressReporter::new(),
            run_state: RunState::default(),
            status: RefCell::new(RunStatus::default()),
            originals: RefCell::new(OriginalTextStore::new()),
            settings: RefCell::new(None),
        }
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn client(&self) -> &TranslationClient {
        &self.client
    }

    pub fn document(&self) -> &Handle {
        &self.document
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TranslationEvent> {
        self.reporter.subscribe()
    }

    pub fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }

    pub fn is_translating(&self) -> bool {
        self.run_state.is_running()
    }

    pub fn status(&self) -> RunStatus {
        self.status.borrow().clone()
    }

    /// 已备份原文的节点数
    pub fn translated_node_count(&self) -> usize {
        self.originals.borrow().len()
    }

    /// 设置宿主提供的用户设置
    pub fn set_settings(&self, settings: Settings) {
        *self.settings.borrow_mut() = Some(settings);
    }

    /// 翻译整页
    pub async fn translate_page(&self, api_key: &str, target_lang: &str) -> RunOutcome {
        // 检查并置位之间没有挂起点
        let Some(_guard) = self.run_state.try_begin() else {
            tracing::info!("translation already in progress, ignoring request");
            return RunOutcome::AlreadyRunning;
        };

        *self.status.borrow_mut() = RunStatus::default();

        match self.run(api_key, target_lang).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if e.is_run_fatal() {
                    tracing::error!("translation run aborted: {}", e);
                } else {
                    helpers::log_error(&e);
                }
                let message = e.to_string();
                self.set_phase(RunPhase::Failed, &message);
                self.reporter.error(message.clone());
                RunOutcome::Failed(message)
            }
        }
    }

    async fn run(&self, api_key: &str, target_lang: &str) -> TranslationResult<RunOutcome> {
        if api_key.trim().is_empty() {
            return Err(helpers::validation_error("API key is required"));
        }
        if target_lang.trim().is_empty() {
            return Err(helpers::validation_error("target language is required"));
        }

        self.set_phase(RunPhase::Selecting, "Collecting text...");
        self.progress(0, "Collecting text...");

        let root = content_root(&self.document);
        let mut collector = TextCollector::new(self.collector_config.clone());
        let units = collector.collect_translatable_texts(&root)?;

        if units.is_empty() {
            tracing::info!("no translatable text found");
            self.set_phase(RunPhase::Completed, "No translatable text found");
            self.progress(100, "No translatable text found");
            self.reporter.complete();
            return Ok(RunOutcome::NothingToTranslate);
        }

        let mut stats = RunStats::new(target_lang);
        stats.texts_collected = units.len();

        self.set_phase(RunPhase::Batching, "Preparing batches...");
        let batches = BatchManager::new(self.batch_policy).create_batches(units)?;
        let total = batches.len();
        stats.batches_total = total;

        tracing::info!(
            "translating {} texts in {} batches to {}",
            stats.texts_collected,
            total,
            target_lang
        );
        self.progress(
            constants::PROGRESS_HEAD,
            format!("Found {} texts to translate", stats.texts_collected),
        );

        let span = 100 - constants::PROGRESS_HEAD - constants::PROGRESS_TAIL;

        for (index, batch) in batches.iter().enumerate() {
            let current = index + 1;
            let message = format!("Translating batch {}/{}...", current, total);
            self.set_phase(RunPhase::Translating { current, total }, &message);

            match self
                .client
                .translate_batch(api_key, &batch.source_texts(), target_lang)
                .await
            {
                Ok(result) => {
                    if result.from_cache {
                        stats.batches_cached += 1;
                    }
                    if result.method.is_fallback() {
                        stats.batches_fallback += 1;
                        self.reporter.warn(format!(
                            "Batch {}/{}: translation count mismatch, original text kept",
                            current, total
                        ));
                    }

                    let applied = self.applier.apply(
                        batch,
                        &result.translations,
                        &mut self.originals.borrow_mut(),
                    );
                    stats.words += applied.words;
                    stats.texts_translated += applied.applied;
                }
                Err(e) if e.is_run_fatal() => return Err(e),
                Err(e) => {
                    stats.batches_failed += 1;
                    tracing::error!("batch {}/{} failed and was skipped: {}", current, total, e);
                    self.reporter
                        .warn(format!("Batch {}/{} failed: {}", current, total, e));
                }
            }

            let percent = constants::PROGRESS_HEAD as usize + span as usize * current / total;
            self.progress(
                percent as u8,
                format!("Translated batch {}/{}", current, total),
            );

            if current < total {
                sleep(self.config.batch_delay()).await;
            }
        }

        self.set_phase(RunPhase::Finalizing, "Finalizing...");
        self.applier.mark_translated(&self.document, target_lang);
        stats.page_translated = true;

        tracing::info!(
            "translation finished: {} words, {} failed batches, {} fallbacks",
            stats.words,
            stats.batches_failed,
            stats.batches_fallback
        );

        self.set_phase(RunPhase::Completed, "Translation complete");
        self.progress(100, "Translation complete");
        self.reporter.complete();

        Ok(RunOutcome::Completed(stats))
    }

    /// 恢复全部原文
    pub fn restore(&self) -> RestoreReport {
        let report = self
            .applier
            .restore(&self.document, &mut self.originals.borrow_mut());
        if !self.is_translating() {
            *self.status.borrow_mut() = RunStatus::default();
        }
        report
    }

    /// 翻译一段选中的文本
    pub async fn translate_selection(
        &self,
        api_key: &str,
        text: &str,
        target_lang: &str,
    ) -> TranslationResult<String> {
        if api_key.trim().is_empty() {
            return Err(helpers::validation_error("API key is required"));
        }
        if text.trim().is_empty() {
            return Err(helpers::validation_error("no text selected"));
        }
        self.client.translate_text(api_key, text, target_lang).await
    }

    /// 按宿主设置决定是否自动翻译
    pub async fn auto_translate_check(&self) -> Response {
        let settings = self.settings.borrow().clone();

        match settings {
            Some(settings) if settings.auto_translate_enabled() => {
                let lang = if settings.target_language.trim().is_empty() {
                    self.config.target_lang.clone()
                } else {
                    settings.target_language.clone()
                };
                self.translate_page(&settings.api_key, &lang)
                    .await
                    .into_response()
            }
            _ => {
                tracing::debug!("auto-translate disabled or no API key configured");
                Response::skipped("auto-translate is disabled")
            }
        }
    }

    /// 处理一条控制端请求
    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::Translate {
                api_key,
                target_language,
            } => self
                .translate_page(&api_key, &target_language)
                .await
                .into_response(),
            Request::Restore => {
                self.restore();
                Response::ok()
            }
            Request::GetStatus => {
                let status = self.status.borrow();
                Response::Status {
                    is_translating: self.is_translating(),
                    progress: status.progress,
                    message: status.message.clone(),
                }
            }
            Request::TranslateSelection {
                api_key,
                target_language,
                text,
            } => match self
                .translate_selection(&api_key, &text, &target_language)
                .await
            {
                Ok(translation) => Response::translation(translation),
                Err(e) => {
                    helpers::log_error(&e);
                    Response::error(e.to_string())
                }
            },
            Request::AutoTranslateCheck => self.auto_translate_check().await,
        }
    }

    /// 按配置的去抖间隔创建文档观察器
    pub fn observer(&self) -> (MutationNotifier, DocumentObserver) {
        observe(self.config.observer_debounce())
    }

    /// 观察文档变化，去抖后重新翻译
    pub async fn watch(&self, observer: DocumentObserver, api_key: &str, target_lang: &str) {
        let stats = observer
            .run(
                move || self.is_translating(),
                move || async move {
                    let outcome = self.translate_page(api_key, target_lang).await;
                    tracing::debug!("re-translation finished: {:?}", outcome);
                },
            )
            .await;

        tracing::debug!("observer stopped: {:?}", stats);
    }

    fn set_phase(&self, phase: RunPhase, message: &str) {
        let mut status = self.status.borrow_mut();
        status.phase = phase;
        status.message = message.to_string();
    }

    /// 更新进度并发布事件，同一次运行内进度不回退
    fn progress(&self, percent: u8, message: impl Into<String>) {
        let message = message.into();
        let percent = {
            let mut status = self.status.borrow_mut();
            let percent = percent.min(100).max(status.progress);
            status.progress = percent;
            status.message = message.clone();
            percent
        };
        self.reporter.report(percent, message);
    }
}

/// 内容根节点：优先取 `<body>`，否则取整个文档
fn content_root(document: &Handle) -> Handle {
    find_nodes(document, &["html", "body"])
        .into_iter()
        .next()
        .unwrap_or_else(|| document.clone())
}
