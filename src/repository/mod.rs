// ==========================================
// 门店库存同步系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: 仓储只借用连接，不持有连接
// ==========================================

pub mod error;
pub mod exclusion_repo;
pub mod product_repo;
pub mod weekly_record_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use exclusion_repo::ExclusionRepository;
pub use product_repo::ProductRepository;
pub use weekly_record_repo::{WeeklyRecordRepository, DAY_COLUMNS};
