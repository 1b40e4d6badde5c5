// ==========================================
// 门店库存同步系统 - 历史库存时间序列重建
// ==========================================
// 职责: 将每周记录展开为按日期排序的 (日期, 库存) 序列
// 规则: 空槽位直接省略，不补 0
// ==========================================

use crate::db::ConnectionFactory;
use crate::domain::history::{TimeSeries, TimeSeriesPoint, WeekRange};
use crate::domain::inventory::WeeklyInventoryRecord;
use crate::domain::types::{iso_weeks_in_year, DAY_SLOT_COUNT};
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::{ProductRepository, WeeklyRecordRepository};
use chrono::{Datelike, Duration, NaiveDate};
use tracing::{debug, instrument};

/// ISO 周日期 → 日历日期
///
/// 第 1 周的周一 = 当年 1 月 4 日回退到所在周的周一；
/// 结果 = 该周一 + (week - 1) 周 + weekday 天
///
/// # 返回
/// - None: week 超出该 ISO 年的周数、weekday 不在 0..=6 或日期溢出
pub fn iso_week_date(year: i32, week: u32, weekday: u32) -> Option<NaiveDate> {
    if week == 0 || week > iso_weeks_in_year(year)? || weekday as usize >= DAY_SLOT_COUNT {
        return None;
    }
    let jan4 = NaiveDate::from_ymd_opt(year, 1, 4)?;
    let week1_monday =
        jan4.checked_sub_signed(Duration::days(jan4.weekday().num_days_from_monday() as i64))?;
    let offset = Duration::weeks(week as i64 - 1) + Duration::days(weekday as i64);
    week1_monday.checked_add_signed(offset)
}

/// 展开一条周记录为若干日观测点（跳过空槽位）
pub fn expand_record(record: &WeeklyInventoryRecord) -> Vec<TimeSeriesPoint> {
    record
        .slots
        .iter()
        .enumerate()
        .filter_map(|(weekday, slot)| {
            let quantity = (*slot)?;
            let date = iso_week_date(record.year, record.week, weekday as u32)?;
            Some(TimeSeriesPoint { date, quantity })
        })
        .collect()
}

// ==========================================
// TimeSeriesReconstructor
// ==========================================
#[derive(Debug, Clone)]
pub struct TimeSeriesReconstructor {
    connections: ConnectionFactory,
}

impl TimeSeriesReconstructor {
    pub fn new(connections: ConnectionFactory) -> Self {
        Self { connections }
    }

    /// 重建单个货号在周区间内的库存序列
    ///
    /// # 参数
    /// - article_number: 货号
    /// - range: 周闭区间（不含年份，跨年区间由调用方拆分）
    ///
    /// # 返回
    /// - Ok(TimeSeries): 可能为空序列
    /// - Err(ProductNotFound): 商品不存在
    #[instrument(skip(self), fields(start = range.start_week, end = range.end_week))]
    pub fn reconstruct(&self, article_number: &str, range: WeekRange) -> EngineResult<TimeSeries> {
        let (product, records) = self.connections.with_connection(|conn| {
            let product = ProductRepository::new(conn)
                .find_by_article(article_number)?
                .ok_or_else(|| EngineError::ProductNotFound {
                    article: article_number.to_string(),
                })?;
            let records = WeeklyRecordRepository::new(conn).find_by_week_range(
                product.id,
                range.start_week,
                range.end_week,
            )?;
            Ok::<_, EngineError>((product, records))
        })?;

        let mut points: Vec<TimeSeriesPoint> = records.iter().flat_map(expand_record).collect();
        // 源数据顺序不可信，按日期重排
        points.sort_by_key(|p| p.date);

        debug!(records = records.len(), points = points.len(), "时间序列重建完成");
        Ok(TimeSeries {
            article_number: product.article_number,
            description: product.description,
            points,
        })
    }
}
