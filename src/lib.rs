// ==========================================
// 门店库存同步系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 门店库存快照导入、缺货/低库存识别、
//           每周库存归档与历史库存回看
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 上传表格
pub mod importer;

// 引擎层 - 业务规则
pub mod engine;

// 应用层 - 会话
pub mod app;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/schema）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    ActivateOutcome, DeactivateOutcome, InventoryRow, LabelGranularity, Product, SyncAnchor,
    SyncMode, TimeSeries, TimeSeriesPoint, WeekRange, WeeklyInventoryRecord,
};

// 导入
pub use importer::{CurrentSnapshot, ImportError, SpreadsheetIngestor};

// 引擎
pub use engine::{
    ArticleRelay, EngineError, EngineResult, ExclusionRegistry, InventoryClassifier,
    RelayDispatcher, SyncEvent, SyncObserver, SyncPipeline, SyncReport, TimeSeriesReconstructor,
};

// 应用
pub use app::{InventorySession, SyncHandle};

// 配置
pub use config::AppConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "门店库存同步系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
