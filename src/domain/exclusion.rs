// ==========================================
// 门店库存同步系统 - 排除清单领域模型
// ==========================================
// 对齐: exclusion_entry 表
// 红线: 行一经创建永不删除，仅切换 active
// ==========================================

use serde::{Deserialize, Serialize};

/// 排除清单条目（不再补货的货号）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionEntry {
    pub article: String,
    pub active: bool,
}
