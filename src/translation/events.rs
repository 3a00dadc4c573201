//! 翻译事件
//!
//! 编排器通过广播通道发布进度与结果事件，控制端按需订阅。
//! 没有订阅者时发送失败会被直接忽略。

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// 事件通道容量，慢订阅者超出后会丢失最早的事件
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// 出站事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum TranslationEvent {
    #[serde(alias = "translationProgress")]
    Progress {
        progress: u8,
        #[serde(alias = "text")]
        message: String,
    },
    /// 批次级问题（对齐失败、重试耗尽），不影响整页运行
    TranslationWarning { message: String },
    TranslationComplete,
    TranslationError { error: String },
}

impl TranslationEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TranslationEvent::TranslationComplete | TranslationEvent::TranslationError { .. }
        )
    }
}

/// 进度报告器
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    sender: broadcast::Sender<TranslationEvent>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TranslationEvent> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// 报告进度，百分比超过 100 时按 100 处理
    pub fn report(&self, percent: u8, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("progress {}%: {}", percent.min(100), message);
        self.publish(TranslationEvent::Progress {
            progress: percent.min(100),
            message,
        });
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.publish(TranslationEvent::TranslationWarning {
            message: message.into(),
        });
    }

    pub fn complete(&self) {
        self.publish(TranslationEvent::TranslationComplete);
    }

    pub fn error(&self, error: impl Into<String>) {
        self.publish(TranslationEvent::TranslationError {
            error: error.into(),
        });
    }

    pub fn publish(&self, event: TranslationEvent) {
        // 没有订阅者时 send 返回错误，忽略即可
        let _ = self.sender.send(event);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_without_listeners_is_silent() {
        let reporter = ProgressReporter::new();
        assert_eq!(reporter.listener_count(), 0);
        reporter.report(50, "halfway");
        reporter.complete();
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let reporter = ProgressReporter::new();
        let mut rx = reporter.subscribe();

        reporter.report(10, "start");
        reporter.report(250, "overflow");
        reporter.complete();

        assert_eq!(
            rx.recv().await.unwrap(),
            TranslationEvent::Progress {
                progress: 10,
                message: "start".to_string()
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            TranslationEvent::Progress {
                progress: 100,
                message: "overflow".to_string()
            }
        );
        assert!(rx.recv().await.unwrap().is_terminal());
    }

    #[test]
    fn events_serialize_with_action_tag() {
        let json = serde_json::to_value(TranslationEvent::Progress {
            progress: 42,
            message: "Translating".to_string(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"action": "progress", "progress": 42, "message": "Translating"})
        );

        let json = serde_json::to_value(TranslationEvent::TranslationComplete).unwrap();
        assert_eq!(json, serde_json::json!({"action": "translationComplete"}));

        let json = serde_json::to_value(TranslationEvent::TranslationError {
            error: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"action": "translationError", "error": "boom"}));
    }

    #[test]
    fn legacy_progress_shape_is_accepted() {
        let event: TranslationEvent = serde_json::from_str(
            r#"{"action":"translationProgress","progress":5,"text":"Collecting"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            TranslationEvent::Progress {
                progress: 5,
                message: "Collecting".to_string()
            }
        );
    }
}
