// ==========================================
// 门店库存同步系统 - 引擎层
// ==========================================
// 职责: 排除清单、库存分类、快照同步、历史序列、货号转发
// 红线: Engine 不拼 SQL，数据访问全部经由 repository
// ==========================================

pub mod classifier;
pub mod error;
pub mod events;
pub mod exclusion_registry;
pub mod relay;
pub mod sync_pipeline;
pub mod time_series;

// 重导出核心引擎
pub use classifier::{ClassificationSets, InventoryClassifier};
pub use error::{EngineError, EngineResult};
pub use events::{ChannelObserver, NoOpObserver, SyncEvent, SyncObserver, SyncReport};
pub use exclusion_registry::{ExclusionLookup, ExclusionRegistry};
pub use relay::{ArticleRelay, RecordingRelay, RelayDispatcher};
pub use sync_pipeline::SyncPipeline;
pub use time_series::{expand_record, iso_week_date, TimeSeriesReconstructor};
