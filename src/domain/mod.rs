// ==========================================
// 门店库存同步系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与值类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod exclusion;
pub mod history;
pub mod inventory;
pub mod types;

// 重导出核心类型
pub use exclusion::ExclusionEntry;
pub use history::{LabelGranularity, TimeSeries, TimeSeriesPoint, WeekRange};
pub use inventory::{
    normalize_article_number, InventoryRow, NewProduct, Product, WeeklyInventoryRecord,
};
pub use types::{
    iso_weeks_in_year, ActivateOutcome, DeactivateOutcome, SyncAnchor, SyncMode, DAY_SLOT_COUNT,
};
