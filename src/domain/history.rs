// ==========================================
// 门店库存同步系统 - 历史库存时间序列
// ==========================================
// 职责: 查询区间、时间序列点、图表刻度提示
// ==========================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// 跨度不超过该天数时按天标注横轴
pub const DAILY_LABEL_MAX_SPAN_DAYS: i64 = 14;

// ==========================================
// WeekRange - 周区间（闭区间，不含年份）
// ==========================================
// 调用方约定: 跨年区间（如 50..5）必须自行拆分为两次查询
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRange {
    pub start_week: u32,
    pub end_week: u32,
}

impl WeekRange {
    /// 创建周区间，start_week > end_week 时返回 None
    pub fn new(start_week: u32, end_week: u32) -> Option<Self> {
        if start_week > end_week {
            return None;
        }
        Some(Self {
            start_week,
            end_week,
        })
    }

    /// 解析用户输入的周区间
    ///
    /// - 起始周无法解析 → 0
    /// - 结束周无法解析 → today 所在 ISO 周
    pub fn parse_or_default(start: &str, end: &str, today: NaiveDate) -> Self {
        let start_week = start.trim().parse::<u32>().unwrap_or(0);
        let end_week = end
            .trim()
            .parse::<u32>()
            .unwrap_or_else(|_| today.iso_week().week());
        Self {
            start_week,
            end_week,
        }
    }

    pub fn contains(&self, week: u32) -> bool {
        week >= self.start_week && week <= self.end_week
    }
}

/// 单日库存观测
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub quantity: f64,
}

/// 横轴刻度粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LabelGranularity {
    Daily,  // 每天一个刻度
    Weekly, // 每周一一个刻度
}

// ==========================================
// TimeSeries - 重建后的按日序列
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub article_number: String,
    pub description: Option<String>,
    pub points: Vec<TimeSeriesPoint>, // 按日期升序
}

impl TimeSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 首尾日期跨度（天）
    pub fn span_days(&self) -> i64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (last.date - first.date).num_days(),
            _ => 0,
        }
    }

    pub fn label_granularity(&self) -> LabelGranularity {
        if self.span_days() <= DAILY_LABEL_MAX_SPAN_DAYS {
            LabelGranularity::Daily
        } else {
            LabelGranularity::Weekly
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(y: i32, m: u32, d: u32, q: f64) -> TimeSeriesPoint {
        TimeSeriesPoint {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            quantity: q,
        }
    }

    #[test]
    fn test_week_range_parse_or_default() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 14).unwrap(); // ISO 第 3 周
        assert_eq!(
            WeekRange::parse_or_default("abc", "", today),
            WeekRange {
                start_week: 0,
                end_week: 3
            }
        );
        assert_eq!(
            WeekRange::parse_or_default(" 2 ", "10", today),
            WeekRange {
                start_week: 2,
                end_week: 10
            }
        );
        assert!(WeekRange::new(5, 4).is_none());
        assert!(WeekRange::new(4, 4).unwrap().contains(4));
    }

    #[test]
    fn test_label_granularity() {
        let mut series = TimeSeries {
            article_number: "1".to_string(),
            description: None,
            points: vec![point(2025, 1, 1, 1.0), point(2025, 1, 15, 2.0)],
        };
        assert_eq!(series.span_days(), 14);
        assert_eq!(series.label_granularity(), LabelGranularity::Daily);

        series.points.push(point(2025, 1, 16, 3.0));
        assert_eq!(series.label_granularity(), LabelGranularity::Weekly);

        series.points.clear();
        assert_eq!(series.span_days(), 0);
        assert!(series.is_empty());
    }
}
