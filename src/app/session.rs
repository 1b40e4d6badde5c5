// ==========================================
// 门店库存同步系统 - 应用会话
// ==========================================
// 职责: 持有会话内状态（快照/分类集合/同步标记），组合各引擎
// 说明: 同步在后台阻塞线程中运行，进度经通道回传；
//       其余操作在调用线程同步执行，按操作获取连接
// ==========================================

use crate::config::AppConfig;
use crate::db::ConnectionFactory;
use crate::domain::history::{TimeSeries, WeekRange};
use crate::domain::types::{ActivateOutcome, DeactivateOutcome, SyncAnchor, SyncMode};
use crate::engine::{
    ArticleRelay, ChannelObserver, EngineError, EngineResult, ExclusionRegistry,
    InventoryClassifier, NoOpObserver, RelayDispatcher, SyncEvent, SyncPipeline, SyncReport,
    TimeSeriesReconstructor,
};
use crate::importer::{CurrentSnapshot, DepartmentLight, IngestSummary, RawSheet, SpreadsheetIngestor};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

/// 会话计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionCounters {
    pub batches_ingested: usize,
    pub exclusion_changes: usize,
}

// ==========================================
// SyncHandle - 后台同步句柄
// ==========================================
pub struct SyncHandle {
    pub events: UnboundedReceiver<SyncEvent>,
    task: JoinHandle<EngineResult<SyncReport>>,
}

impl SyncHandle {
    /// 等待后台同步结束（事件接收端随句柄一起丢弃）
    pub async fn wait(self) -> EngineResult<SyncReport> {
        join_sync_task(self.task).await
    }

    /// 拆分为事件接收端与任务句柄
    pub fn into_parts(
        self,
    ) -> (
        UnboundedReceiver<SyncEvent>,
        JoinHandle<EngineResult<SyncReport>>,
    ) {
        (self.events, self.task)
    }
}

async fn join_sync_task(task: JoinHandle<EngineResult<SyncReport>>) -> EngineResult<SyncReport> {
    task.await
        .map_err(|e| EngineError::TaskFailed(e.to_string()))?
}

// ==========================================
// InventorySession
// ==========================================
pub struct InventorySession {
    config: AppConfig,
    connections: ConnectionFactory,
    ingestor: SpreadsheetIngestor,
    classifier: InventoryClassifier,
    exclusions: ExclusionRegistry,
    history: TimeSeriesReconstructor,
    relay: RelayDispatcher,
    synced: Arc<AtomicBool>,
    counters: SessionCounters,
}

impl InventorySession {
    /// 使用已就绪的数据库创建会话（不建表）
    pub fn new(config: AppConfig, connections: ConnectionFactory) -> Self {
        Self {
            ingestor: SpreadsheetIngestor::from_config(&config),
            classifier: InventoryClassifier::new(),
            exclusions: ExclusionRegistry::new(connections.clone()),
            history: TimeSeriesReconstructor::new(connections.clone()),
            relay: RelayDispatcher::from_millis(config.relay_item_delay_ms),
            synced: Arc::new(AtomicBool::new(false)),
            counters: SessionCounters::default(),
            config,
            connections,
        }
    }

    /// 打开会话：按配置定位数据库并确保 schema 就绪
    pub fn open(config: AppConfig) -> EngineResult<Self> {
        let connections = ConnectionFactory::new(config.db_path.clone());
        connections.bootstrap()?;
        info!(db_path = %connections.db_path(), "会话已打开");
        Ok(Self::new(config, connections))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &CurrentSnapshot {
        self.ingestor.snapshot()
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::SeqCst)
    }

    // ===== 导入 =====

    pub fn ingest_file<P: AsRef<Path>>(&mut self, file_path: P) -> EngineResult<IngestSummary> {
        let summary = self.ingestor.ingest_file(file_path)?;
        self.counters.batches_ingested += 1;
        Ok(summary)
    }

    pub fn ingest(&mut self, sheet: &RawSheet) -> EngineResult<IngestSummary> {
        let summary = self.ingestor.ingest(sheet)?;
        self.counters.batches_ingested += 1;
        Ok(summary)
    }

    pub fn department_lights(&self) -> Vec<DepartmentLight> {
        self.ingestor.department_lights()
    }

    // ===== 分类 =====

    pub fn find_zeros(&mut self) -> EngineResult<&BTreeSet<String>> {
        self.classifier
            .classify_zero(self.ingestor.snapshot(), &self.exclusions)
    }

    pub fn find_lows(&mut self) -> EngineResult<&BTreeSet<String>> {
        self.classifier
            .classify_low(self.ingestor.snapshot(), self.config.low_threshold)
    }

    pub fn zero_stock(&self) -> &BTreeSet<String> {
        self.classifier.zero_stock()
    }

    pub fn low_stock(&self) -> &BTreeSet<String> {
        self.classifier.low_stock()
    }

    pub fn reset_classification(&mut self) {
        self.classifier.reset();
    }

    // ===== 排除清单 =====

    pub fn activate_exclusion(&mut self, article: &str) -> EngineResult<ActivateOutcome> {
        let outcome = self.exclusions.activate(article)?;
        if outcome != ActivateOutcome::AlreadyActive {
            self.counters.exclusion_changes += 1;
        }
        Ok(outcome)
    }

    pub fn deactivate_exclusion(&mut self, article: &str) -> EngineResult<DeactivateOutcome> {
        let outcome = self.exclusions.deactivate(article)?;
        if outcome == DeactivateOutcome::Deactivated {
            self.counters.exclusion_changes += 1;
        }
        Ok(outcome)
    }

    pub fn active_exclusions(&self) -> EngineResult<BTreeSet<String>> {
        self.exclusions.list_active()
    }

    pub fn exclusions(&self) -> &ExclusionRegistry {
        &self.exclusions
    }

    // ===== 历史序列 =====

    pub fn history(&self, article_number: &str, range: WeekRange) -> EngineResult<TimeSeries> {
        self.history.reconstruct(article_number, range)
    }

    /// 以用户输入的起止周查询（无法解析时取默认值）
    pub fn history_from_input(
        &self,
        article_number: &str,
        start: &str,
        end: &str,
        today: NaiveDate,
    ) -> EngineResult<TimeSeries> {
        let range = WeekRange::parse_or_default(start, end, today);
        self.history(article_number, range)
    }

    // ===== 转发 =====

    pub fn dispatch_zeros(&self, relay: &mut dyn ArticleRelay) -> EngineResult<usize> {
        self.relay
            .dispatch(relay, self.classifier.zero_stock().iter().cloned())
    }

    pub fn dispatch_lows(&self, relay: &mut dyn ArticleRelay) -> EngineResult<usize> {
        self.relay
            .dispatch(relay, self.classifier.low_stock().iter().cloned())
    }

    // ===== 同步 =====

    /// 在后台启动交互式同步
    ///
    /// 必须在 tokio 运行时内调用。
    ///
    /// # 返回
    /// - Ok(Some(SyncHandle)): 已启动
    /// - Ok(None): 本会话已同步过
    /// - Err(EmptyInventory): 快照为空
    /// - Err(ConnectionError): 连接获取失败（启动前即返回）
    #[instrument(skip(self), fields(anchor = %anchor))]
    pub fn start_sync(&self, anchor: SyncAnchor) -> EngineResult<Option<SyncHandle>> {
        if self.is_synced() {
            info!("本会话快照已同步，跳过");
            return Ok(None);
        }
        if self.snapshot().is_empty() {
            return Err(EngineError::EmptyInventory);
        }

        let mut conn = self.connections.acquire()?;
        let rows = self.snapshot().rows().to_vec();
        let synced = Arc::clone(&self.synced);
        let (tx, rx) = unbounded_channel();

        let task = tokio::task::spawn_blocking(move || {
            let observer = ChannelObserver::new(tx);
            let report =
                SyncPipeline::run(&mut conn, &rows, anchor, SyncMode::Interactive, &observer)?;
            synced.store(true, Ordering::SeqCst);
            Ok::<_, EngineError>(report)
        });

        Ok(Some(SyncHandle { events: rx, task }))
    }

    /// 结束会话
    ///
    /// 快照非空且尚未同步时执行一次静默同步（无超时），然后输出会话汇总。
    /// 汇总总会输出；静默同步失败时在汇总之后返回该错误。
    #[instrument(skip(self), fields(anchor = %anchor))]
    pub async fn shutdown(self, anchor: SyncAnchor) -> EngineResult<Option<SyncReport>> {
        let forced = self.forced_sync(anchor).await;
        if let Err(e) = &forced {
            error!(error = %e, "退出前静默同步失败");
        }

        info!(
            batches_ingested = self.counters.batches_ingested,
            snapshot_rows = self.snapshot().len(),
            zero_stock = self.classifier.zero_stock().len(),
            low_stock = self.classifier.low_stock().len(),
            exclusion_changes = self.counters.exclusion_changes,
            synced = self.is_synced(),
            "会话结束"
        );
        forced
    }

    async fn forced_sync(&self, anchor: SyncAnchor) -> EngineResult<Option<SyncReport>> {
        if self.snapshot().is_empty() || self.is_synced() {
            return Ok(None);
        }
        warn!(rows = self.snapshot().len(), "快照尚未同步，执行退出前静默同步");
        let mut conn = self.connections.acquire()?;
        let rows = self.snapshot().rows().to_vec();
        let synced = Arc::clone(&self.synced);

        let task = tokio::task::spawn_blocking(move || {
            let report =
                SyncPipeline::run(&mut conn, &rows, anchor, SyncMode::Silent, &NoOpObserver)?;
            synced.store(true, Ordering::SeqCst);
            Ok::<_, EngineError>(report)
        });
        join_sync_task(task).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RecordingRelay;
    use tempfile::TempDir;

    const HEADERS: [&str; 5] = [
        "Department",
        "Merchandise Category",
        "Article Description",
        "Article",
        "Inventory",
    ];

    fn session(dir: &TempDir) -> InventorySession {
        let config = AppConfig {
            db_path: dir.path().join("inv.db").to_string_lossy().into_owned(),
            relay_item_delay_ms: 0,
            ..AppConfig::default()
        };
        InventorySession::open(config).unwrap()
    }

    fn sheet(rows: Vec<Vec<&str>>) -> RawSheet {
        RawSheet::from_rows(&HEADERS, rows)
    }

    #[test]
    fn test_exclusion_counter_counts_changes_only() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);

        session.activate_exclusion("1").unwrap();
        session.activate_exclusion("1").unwrap();
        session.deactivate_exclusion("1").unwrap();
        session.deactivate_exclusion("1").unwrap();

        assert_eq!(session.counters().exclusion_changes, 2);
    }

    #[test]
    fn test_find_zeros_uses_exclusion_registry() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        session
            .ingest(&sheet(vec![
                vec!["Grocery", "Dairy", "Milk", "1", "0"],
                vec!["Grocery", "Dairy", "Cream", "2", "0"],
            ]))
            .unwrap();
        session.activate_exclusion("2").unwrap();

        let zeros: Vec<String> = session.find_zeros().unwrap().iter().cloned().collect();
        assert_eq!(zeros, vec!["1".to_string()]);
    }

    #[test]
    fn test_dispatch_zeros_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        session
            .ingest(&sheet(vec![
                vec!["Grocery", "Dairy", "Milk", "30", "0"],
                vec!["Grocery", "Dairy", "Cream", "10", "0"],
            ]))
            .unwrap();
        session.find_zeros().unwrap();

        let mut relay = RecordingRelay::default();
        assert_eq!(session.dispatch_zeros(&mut relay).unwrap(), 2);
        assert_eq!(relay.submitted, vec!["10".to_string(), "30".to_string()]);
    }

    #[tokio::test]
    async fn test_start_sync_on_empty_snapshot() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir);
        assert!(matches!(
            session.start_sync(SyncAnchor::new(2025, 3, 1).unwrap()),
            Err(EngineError::EmptyInventory)
        ));
    }

    #[tokio::test]
    async fn test_shutdown_reports_forced_sync_failure() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        session
            .ingest(&sheet(vec![vec!["Grocery", "Dairy", "Milk", "1", "0"]]))
            .unwrap();
        // 删除数据库文件所在目录后，连接获取失败
        drop(dir);

        let err = session
            .shutdown(SyncAnchor::new(2025, 3, 1).unwrap())
            .await
            .unwrap_err();
        assert!(err.is_connection_error());
    }

    #[tokio::test]
    async fn test_shutdown_without_snapshot_does_nothing() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir);
        let forced = session
            .shutdown(SyncAnchor::new(2025, 3, 1).unwrap())
            .await
            .unwrap();
        assert!(forced.is_none());
    }
}
