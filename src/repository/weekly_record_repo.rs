// ==========================================
// 门店库存同步系统 - 每周库存记录仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 写入只触碰一个日槽，其余六个槽位保持不变
// ==========================================

use crate::domain::inventory::WeeklyInventoryRecord;
use crate::domain::types::DAY_SLOT_COUNT;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};

/// 日槽列名（下标即星期索引，0=周一）
pub const DAY_COLUMNS: [&str; DAY_SLOT_COUNT] = [
    "d0_inventory",
    "d1_inventory",
    "d2_inventory",
    "d3_inventory",
    "d4_inventory",
    "d5_inventory",
    "d6_inventory",
];

const SELECT_COLUMNS: &str = "product_id, year, week, \
    d0_inventory, d1_inventory, d2_inventory, d3_inventory, \
    d4_inventory, d5_inventory, d6_inventory";

// ==========================================
// WeeklyRecordRepository - 每周库存记录仓储
// ==========================================
pub struct WeeklyRecordRepository<'c> {
    conn: &'c Connection,
}

impl<'c> WeeklyRecordRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 写入单个日槽（记录不存在则插入，存在则只覆盖该槽）
    ///
    /// # 参数
    /// - product_id: 商品 ID
    /// - year / week: ISO 年/周
    /// - weekday: 星期索引（0..=6）
    /// - quantity: 库存值（None 写入 NULL）
    pub fn upsert_day_slot(
        &self,
        product_id: i64,
        year: i32,
        week: u32,
        weekday: u32,
        quantity: Option<f64>,
    ) -> RepositoryResult<()> {
        let column = DAY_COLUMNS.get(weekday as usize).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "weekday".to_string(),
                message: format!("星期索引越界: {}", weekday),
            }
        })?;

        // 列名来自固定白名单，不接受外部字符串
        let sql = format!(
            "INSERT INTO weekly_inventory_record (product_id, year, week, {col}) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(product_id, year, week) DO UPDATE SET {col} = excluded.{col}",
            col = column
        );
        self.conn
            .execute(&sql, params![product_id, year, week, quantity])?;
        Ok(())
    }

    /// 按主键查询
    pub fn find(
        &self,
        product_id: i64,
        year: i32,
        week: u32,
    ) -> RepositoryResult<Option<WeeklyInventoryRecord>> {
        let sql = format!(
            "SELECT {} FROM weekly_inventory_record \
             WHERE product_id = ?1 AND year = ?2 AND week = ?3",
            SELECT_COLUMNS
        );
        let record = self
            .conn
            .query_row(&sql, params![product_id, year, week], map_record)
            .optional()?;
        Ok(record)
    }

    /// 查询商品在周区间内的全部记录（不区分年份），按 (year, week) 排序
    pub fn find_by_week_range(
        &self,
        product_id: i64,
        start_week: u32,
        end_week: u32,
    ) -> RepositoryResult<Vec<WeeklyInventoryRecord>> {
        let sql = format!(
            "SELECT {} FROM weekly_inventory_record \
             WHERE product_id = ?1 AND week >= ?2 AND week <= ?3 \
             ORDER BY year ASC, week ASC",
            SELECT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![product_id, start_week, end_week], map_record)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 记录总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM weekly_inventory_record",
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}

fn map_record(row: &Row<'_>) -> SqliteResult<WeeklyInventoryRecord> {
    let mut slots = [None; DAY_SLOT_COUNT];
    for (i, slot) in slots.iter_mut().enumerate() {
        *slot = row.get::<_, Option<f64>>(3 + i)?;
    }
    Ok(WeeklyInventoryRecord {
        product_id: row.get(0)?,
        year: row.get(1)?,
        week: row.get(2)?,
        slots,
    })
}
