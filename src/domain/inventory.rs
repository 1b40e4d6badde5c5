// ==========================================
// 门店库存同步系统 - 库存领域模型
// ==========================================
// 职责: 快照行、商品主数据、每周库存记录
// 对齐: products / weekly_inventory_record 表
// ==========================================

use crate::domain::types::DAY_SLOT_COUNT;
use serde::{Deserialize, Serialize};

// ==========================================
// InventoryRow - 快照中的一行
// ==========================================
// 来源: 上传的表格（部门/品类/描述/货号/库存）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub department: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub article_number: Option<String>, // 已规范化，None 表示缺失/无法识别
    pub quantity: Option<f64>,          // None 表示库存列为空或无法解析
}

impl InventoryRow {
    /// 零库存：quantity <= 0
    pub fn is_zero_stock(&self) -> bool {
        matches!(self.quantity, Some(q) if q <= 0.0)
    }

    /// 低库存：0 < quantity <= threshold
    pub fn is_low_stock(&self, threshold: f64) -> bool {
        matches!(self.quantity, Some(q) if q > 0.0 && q <= threshold)
    }

    /// 品类是否命中禁用前缀
    pub fn has_banned_category(&self, banned_prefixes: &[String]) -> bool {
        match self.category.as_deref() {
            Some(cat) => banned_prefixes.iter().any(|p| cat.starts_with(p.as_str())),
            None => false,
        }
    }
}

// ==========================================
// Product - 商品主数据
// ==========================================
// 首次同步时创建，之后不再更新描述/部门/品类
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub article_number: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub category: Option<String>,
}

/// 待插入的商品
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub article_number: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub category: Option<String>,
}

impl NewProduct {
    pub fn from_row(article_number: &str, row: &InventoryRow) -> Self {
        Self {
            article_number: article_number.to_string(),
            description: row.description.clone(),
            department: row.department.clone(),
            category: row.category.clone(),
        }
    }
}

// ==========================================
// WeeklyInventoryRecord - 每周库存记录
// ==========================================
// 主键: (product_id, year, week)
// slots[i] 对应星期索引 i（0=周一），各槽位独立可空
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyInventoryRecord {
    pub product_id: i64,
    pub year: i32,
    pub week: u32,
    pub slots: [Option<f64>; DAY_SLOT_COUNT],
}

impl WeeklyInventoryRecord {
    pub fn slot(&self, weekday: u32) -> Option<f64> {
        self.slots.get(weekday as usize).copied().flatten()
    }

    /// 已填充的槽位数
    pub fn filled_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// 规范化货号
///
/// - 去除首尾空白
/// - 表格数值型货号（如 "100.0"）还原为整数形式 "100"
/// - 空值或 "nan" 视为缺失
pub fn normalize_article_number(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return None;
    }

    if let Some(integral) = trimmed.strip_suffix(".0") {
        if !integral.is_empty() && integral.chars().all(|c| c.is_ascii_digit()) {
            return Some(integral.to_string());
        }
    }

    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with_qty(q: Option<f64>) -> InventoryRow {
        InventoryRow {
            department: None,
            category: None,
            description: None,
            article_number: Some("1".to_string()),
            quantity: q,
        }
    }

    #[test]
    fn test_zero_and_low_are_disjoint() {
        assert!(row_with_qty(Some(0.0)).is_zero_stock());
        assert!(row_with_qty(Some(-3.0)).is_zero_stock());
        assert!(!row_with_qty(Some(0.0)).is_low_stock(2.0));
        assert!(row_with_qty(Some(2.0)).is_low_stock(2.0));
        assert!(!row_with_qty(Some(2.5)).is_low_stock(2.0));
        assert!(!row_with_qty(None).is_zero_stock());
        assert!(!row_with_qty(None).is_low_stock(2.0));
    }

    #[test]
    fn test_banned_category_prefix() {
        let banned = vec!["Fresh-".to_string(), "Lamb".to_string()];
        let mut row = row_with_qty(Some(1.0));
        row.category = Some("Fresh-Cut Fruit".to_string());
        assert!(row.has_banned_category(&banned));
        row.category = Some("Dairy".to_string());
        assert!(!row.has_banned_category(&banned));
        row.category = None;
        assert!(!row.has_banned_category(&banned));
    }

    #[test]
    fn test_normalize_article_number() {
        assert_eq!(normalize_article_number(" 100 "), Some("100".to_string()));
        assert_eq!(normalize_article_number("100.0"), Some("100".to_string()));
        assert_eq!(normalize_article_number("A-100.0"), Some("A-100.0".to_string()));
        assert_eq!(normalize_article_number(""), None);
        assert_eq!(normalize_article_number("NaN"), None);
    }

    #[test]
    fn test_weekly_record_slot_access() {
        let mut slots = [None; DAY_SLOT_COUNT];
        slots[1] = Some(7.0);
        let record = WeeklyInventoryRecord {
            product_id: 1,
            year: 2025,
            week: 3,
            slots,
        };
        assert_eq!(record.slot(1), Some(7.0));
        assert_eq!(record.slot(0), None);
        assert_eq!(record.slot(9), None);
        assert_eq!(record.filled_slots(), 1);
    }
}
