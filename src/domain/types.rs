// ==========================================
// 门店库存同步系统 - 领域类型定义
// ==========================================
// 职责: 同步锚点、排除清单操作结果、同步模式等值类型
// ==========================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 每周记录的日槽数量（周一..周日）
pub const DAY_SLOT_COUNT: usize = 7;

/// ISO 年内的周数（52 或 53）
///
/// 12 月 28 日总落在当年最后一个 ISO 周内
pub fn iso_weeks_in_year(year: i32) -> Option<u32> {
    NaiveDate::from_ymd_opt(year, 12, 28).map(|d| d.iso_week().week())
}

// ==========================================
// 同步锚点 (Sync Anchor)
// ==========================================
// 由调用方显式提供，管道内部不读取系统时钟
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncAnchor {
    /// ISO 年
    pub year: i32,
    /// ISO 周 (1..=52 或 1..=53)
    pub week: u32,
    /// 星期索引 (0=周一 .. 6=周日)
    pub weekday: u32,
}

impl SyncAnchor {
    /// 创建同步锚点
    ///
    /// # 返回
    /// - Some(SyncAnchor): 周号与星期索引合法
    /// - None: week 超出该 ISO 年的周数（无第 53 周的年份拒绝 53）或 weekday 不在 0..=6
    pub fn new(year: i32, week: u32, weekday: u32) -> Option<Self> {
        if week == 0 || week > iso_weeks_in_year(year)? || weekday as usize >= DAY_SLOT_COUNT {
            return None;
        }
        Some(Self {
            year,
            week,
            weekday,
        })
    }

    /// 由日历日期推导锚点（ISO 年/周 + 周一为 0 的星期索引）
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
            weekday: date.weekday().num_days_from_monday(),
        }
    }
}

impl fmt::Display for SyncAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}-D{}", self.year, self.week, self.weekday)
    }
}

// ==========================================
// 排除清单激活结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivateOutcome {
    Inserted,      // 新增
    AlreadyActive, // 已处于激活状态
    Reactivated,   // 由停用恢复为激活
}

impl fmt::Display for ActivateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivateOutcome::Inserted => write!(f, "INSERTED"),
            ActivateOutcome::AlreadyActive => write!(f, "ALREADY_ACTIVE"),
            ActivateOutcome::Reactivated => write!(f, "REACTIVATED"),
        }
    }
}

// ==========================================
// 排除清单停用结果
// ==========================================
// 不存在 / 已停用 两种情况都表现为影响 0 行，无法区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeactivateOutcome {
    Deactivated,
    NotFoundOrAlreadyInactive,
}

impl fmt::Display for DeactivateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeactivateOutcome::Deactivated => write!(f, "DEACTIVATED"),
            DeactivateOutcome::NotFoundOrAlreadyInactive => {
                write!(f, "NOT_FOUND_OR_ALREADY_INACTIVE")
            }
        }
    }
}

// ==========================================
// 同步模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncMode {
    Interactive, // 通过回调汇报进度
    Silent,      // 退出时的强制补同步，无回调
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Interactive => write!(f, "INTERACTIVE"),
            SyncMode::Silent => write!(f, "SILENT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_anchor_rejects_out_of_range() {
        assert!(SyncAnchor::new(2025, 0, 0).is_none());
        assert!(SyncAnchor::new(2025, 54, 0).is_none());
        assert!(SyncAnchor::new(2025, 3, 7).is_none());
        assert_eq!(
            SyncAnchor::new(2025, 3, 1),
            Some(SyncAnchor {
                year: 2025,
                week: 3,
                weekday: 1
            })
        );
    }

    #[test]
    fn test_week_53_only_in_long_years() {
        assert_eq!(iso_weeks_in_year(2020), Some(53));
        assert_eq!(iso_weeks_in_year(2025), Some(52));
        assert_eq!(iso_weeks_in_year(2026), Some(53));

        assert!(SyncAnchor::new(2025, 53, 0).is_none());
        assert!(SyncAnchor::new(2025, 52, 6).is_some());
        assert!(SyncAnchor::new(2020, 53, 6).is_some());

        // 2025-12-29 属于 ISO 2026 年第 1 周
        let anchor = SyncAnchor::from_date(NaiveDate::from_ymd_opt(2025, 12, 29).unwrap());
        assert_eq!(anchor, SyncAnchor::new(2026, 1, 0).unwrap());
    }

    #[test]
    fn test_sync_anchor_from_date_uses_iso_year() {
        // 2024-12-30 是周一，属于 ISO 2025 年第 1 周
        let date = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        let anchor = SyncAnchor::from_date(date);
        assert_eq!(anchor.year, 2025);
        assert_eq!(anchor.week, 1);
        assert_eq!(anchor.weekday, 0);

        // 2025-01-14 是周二，ISO 第 3 周
        let anchor = SyncAnchor::from_date(NaiveDate::from_ymd_opt(2025, 1, 14).unwrap());
        assert_eq!(anchor, SyncAnchor::new(2025, 3, 1).unwrap());
    }

    #[test]
    fn test_display() {
        let anchor = SyncAnchor::new(2025, 3, 1).unwrap();
        assert_eq!(anchor.to_string(), "2025-W03-D1");
        assert_eq!(ActivateOutcome::Reactivated.to_string(), "REACTIVATED");
        assert_eq!(
            DeactivateOutcome::NotFoundOrAlreadyInactive.to_string(),
            "NOT_FOUND_OR_ALREADY_INACTIVE"
        );
    }
}
