// ==========================================
// 门店库存同步系统 - 同步事件
// ==========================================
// 职责: 定义同步进度回调 trait 与事件类型
// 说明: 后台任务只发事件，不直接修改界面状态；
//       界面层是事件的唯一消费者
// ==========================================

use crate::engine::error::EngineError;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// 一次同步运行的结果汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub total: usize,      // 快照行数
    pub processed: usize,  // 已提交行数
    pub skipped: usize,    // 缺失货号被跳过的行数
    pub discovered: usize, // 新建商品数
}

/// 同步事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncEvent {
    Progress { processed: usize, total: usize },
    ProductDiscovered { description: String },
    Error { message: String },
    Complete { report: SyncReport },
}

// ==========================================
// SyncObserver Trait
// ==========================================
pub trait SyncObserver: Send + Sync {
    fn on_progress(&self, processed: usize, total: usize);
    fn on_product_discovered(&self, description: &str);
    fn on_error(&self, error: &EngineError);
    fn on_complete(&self, report: &SyncReport);
}

/// 空操作观察者（静默模式）
#[derive(Debug, Clone, Default)]
pub struct NoOpObserver;

impl SyncObserver for NoOpObserver {
    fn on_progress(&self, _processed: usize, _total: usize) {}
    fn on_product_discovered(&self, _description: &str) {}
    fn on_error(&self, _error: &EngineError) {}
    fn on_complete(&self, _report: &SyncReport) {}
}

// ==========================================
// ChannelObserver - 通过通道转发事件
// ==========================================
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: UnboundedSender<SyncEvent>,
}

impl ChannelObserver {
    pub fn new(tx: UnboundedSender<SyncEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: SyncEvent) {
        // 接收端已关闭时丢弃事件，同步本身继续
        if self.tx.send(event).is_err() {
            tracing::debug!("同步事件接收端已关闭，事件被丢弃");
        }
    }
}

impl SyncObserver for ChannelObserver {
    fn on_progress(&self, processed: usize, total: usize) {
        self.send(SyncEvent::Progress { processed, total });
    }

    fn on_product_discovered(&self, description: &str) {
        self.send(SyncEvent::ProductDiscovered {
            description: description.to_string(),
        });
    }

    fn on_error(&self, error: &EngineError) {
        self.send(SyncEvent::Error {
            message: error.to_string(),
        });
    }

    fn on_complete(&self, report: &SyncReport) {
        self.send(SyncEvent::Complete {
            report: report.clone(),
        });
    }
}
