//! 动态内容观察
//!
//! 宿主在文档发生变化时调用 [`MutationNotifier::notify`]，观察器把一串密集的通知合并成一次触发：
//! 最后一次通知之后安静满 `debounce` 才触发。触发时若已有翻译在运行则直接跳过，
//! 回调运行期间到达的通知（多数是回调自己改写文档造成的）也会被丢弃。

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

/// 文档变化通知端，可任意克隆
#[derive(Debug, Clone)]
pub struct MutationNotifier {
    sender: mpsc::UnboundedSender<()>,
}

impl MutationNotifier {
    /// 报告一次文档变化；观察器已停止时返回 `false`
    pub fn notify(&self) -> bool {
        self.sender.send(()).is_ok()
    }
}

/// 观察结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserverStats {
    pub notifications: usize,
    pub triggers: usize,
    /// 因已有翻译在运行而跳过的触发
    pub skipped_busy: usize,
    /// 回调运行期间被丢弃的通知
    pub discarded: usize,
}

/// 去抖观察器
#[derive(Debug)]
pub struct DocumentObserver {
    receiver: mpsc::UnboundedReceiver<()>,
    debounce: Duration,
    stats: ObserverStats,
}

/// 创建一对通知端与观察器
pub fn observe(debounce: Duration) -> (MutationNotifier, DocumentObserver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        MutationNotifier { sender },
        DocumentObserver {
            receiver,
            debounce,
            stats: ObserverStats::default(),
        },
    )
}

impl DocumentObserver {
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn get_stats(&self) -> ObserverStats {
        self.stats
    }

    /// 等待下一次合并后的触发，返回本次合并的通知数
    ///
    /// 所有通知端都被释放后返回 `None`；关闭前尚在等待中的一串通知仍会触发一次。
    pub async fn next_trigger(&mut self) -> Option<usize> {
        self.receiver.recv().await?;
        let mut coalesced = 1;

        loop {
            match timeout(self.debounce, self.receiver.recv()).await {
                Ok(Some(())) => coalesced += 1,
                Ok(None) | Err(_) => break,
            }
        }

        self.stats.notifications += coalesced;
        Some(coalesced)
    }

    /// 持续观察直到通知端全部关闭
    pub async fn run<B, F, Fut>(mut self, is_busy: B, mut on_trigger: F) -> ObserverStats
    where
        B: Fn() -> bool,
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        while let Some(coalesced) = self.next_trigger().await {
            if is_busy() {
                self.stats.skipped_busy += 1;
                tracing::debug!(
                    "skipping re-translation of {} mutations: run in progress",
                    coalesced
                );
                continue;
            }

            tracing::info!("document changed ({} mutations), re-translating", coalesced);
            self.stats.triggers += 1;
            on_trigger().await;
            self.discard_pending();
        }

        self.stats
    }

    fn discard_pending(&mut self) {
        while self.receiver.try_recv().is_ok() {
            self.stats.discarded += 1;
        }
    }
}
