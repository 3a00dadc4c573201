//! 翻译系统核心模块
//!
//! - **服务层** (`service.rs`): 整页翻译的编排与控制端请求处理
//! - **客户端** (`client.rs`): chat-completion 请求、重试与批次缓存
//! - **对齐** (`reconcile.rs`): 把模型回复拆回逐条译文
//! - **回写** (`applier.rs`): 写回译文、备份与恢复原文

pub mod applier;
pub mod client;
pub mod reconcile;
pub mod service;

pub use applier::{ApplyReport, Applier};
pub use client::{BatchTranslation, ClientConfig, ClientStats, TranslationClient};
pub use reconcile::{reconcile, Reconciled, Reconciliation};
pub use service::{RunGuard, RunOutcome, RunPhase, RunState, RunStatus, TranslationService};
