// ==========================================
// 门店库存同步系统 - 字段映射器实现
// ==========================================
// 职责: 源列名 → InventoryRow + 类型转换
// ==========================================

use crate::domain::inventory::{normalize_article_number, InventoryRow};
use std::collections::HashMap;

/// 上传表格的固定列名
pub mod columns {
    pub const DEPARTMENT: &str = "Department";
    pub const CATEGORY: &str = "Merchandise Category";
    pub const DESCRIPTION: &str = "Article Description";
    pub const ARTICLE: &str = "Article";
    pub const QUANTITY: &str = "Inventory";

    /// 必需列（缺一即拒绝整个批次）
    pub const REQUIRED: [&str; 5] = [DEPARTMENT, CATEGORY, DESCRIPTION, ARTICLE, QUANTITY];
}

pub struct FieldMapper;

impl FieldMapper {
    /// 将原始行映射为 InventoryRow
    ///
    /// 文本列空白 → None；货号规范化；库存无法解析 → None
    pub fn map_row(&self, row: &HashMap<String, String>) -> InventoryRow {
        InventoryRow {
            department: self.get_string(row, columns::DEPARTMENT),
            category: self.get_string(row, columns::CATEGORY),
            description: self.get_string(row, columns::DESCRIPTION),
            article_number: row
                .get(columns::ARTICLE)
                .and_then(|v| normalize_article_number(v)),
            quantity: self.parse_f64(row, columns::QUANTITY),
        }
    }

    fn get_string(&self, row: &HashMap<String, String>, key: &str) -> Option<String> {
        row.get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    }

    fn parse_f64(&self, row: &HashMap<String, String>, key: &str) -> Option<f64> {
        self.get_string(row, key)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|q| q.is_finite())
    }
}
