// ==========================================
// 门店库存同步系统 - 应用层
// ==========================================
// 职责: 会话状态与引擎组合，供界面层/命令行调用
// ==========================================

pub mod session;

pub use session::{InventorySession, SessionCounters, SyncHandle};
