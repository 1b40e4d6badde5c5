// ==========================================
// 门店库存同步系统 - 快照同步管道
// ==========================================
// 职责: 将当前快照逐行写入商品表与每周库存记录
// 规则:
//   - 缺失货号的行静默跳过
//   - 已存在商品不更新描述/部门/品类
//   - 每行（商品查询/插入 + 日槽写入）单独一个事务
//   - 连接类错误中止本次运行，已提交的行保留，不重试
// ==========================================

use crate::domain::inventory::{InventoryRow, NewProduct};
use crate::domain::types::{SyncAnchor, SyncMode};
use crate::engine::error::EngineResult;
use crate::engine::events::{SyncObserver, SyncReport};
use crate::repository::{ProductRepository, WeeklyRecordRepository};
use rusqlite::Connection;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// 单行的写入结果
enum RowOutcome {
    Skipped,
    Existing,
    Discovered(String),
}

pub struct SyncPipeline;

impl SyncPipeline {
    /// 执行一次完整同步
    ///
    /// # 参数
    /// - conn: 本次运行独占的连接
    /// - rows: 快照行（按快照顺序）
    /// - anchor: 调用方给定的 (ISO 年, ISO 周, 星期索引)
    /// - mode: 交互/静默
    /// - observer: 进度回调；静默模式传 NoOpObserver
    ///
    /// # 返回
    /// - Ok(SyncReport): 全部行处理完毕
    /// - Err: 首个失败行的错误（之前已提交的行保留）
    #[instrument(skip(conn, rows, observer), fields(total = rows.len(), anchor = %anchor, mode = %mode))]
    pub fn run(
        conn: &mut Connection,
        rows: &[InventoryRow],
        anchor: SyncAnchor,
        mode: SyncMode,
        observer: &dyn SyncObserver,
    ) -> EngineResult<SyncReport> {
        let run_id = Uuid::new_v4();
        let total = rows.len();
        let mut report = SyncReport {
            run_id,
            total,
            processed: 0,
            skipped: 0,
            discovered: 0,
        };
        info!(run_id = %run_id, "开始同步快照");

        for (idx, row) in rows.iter().enumerate() {
            match sync_row(conn, row, anchor) {
                Ok(RowOutcome::Skipped) => report.skipped += 1,
                Ok(RowOutcome::Existing) => report.processed += 1,
                Ok(RowOutcome::Discovered(description)) => {
                    report.processed += 1;
                    report.discovered += 1;
                    observer.on_product_discovered(&description);
                }
                Err(e) => {
                    error!(
                        run_id = %run_id,
                        row = idx,
                        processed = report.processed,
                        error = %e,
                        "同步中止"
                    );
                    observer.on_error(&e);
                    return Err(e);
                }
            }
            observer.on_progress(idx + 1, total);
        }

        if report.skipped > 0 {
            warn!(run_id = %run_id, skipped = report.skipped, "部分行缺失货号，已跳过");
        }
        info!(
            run_id = %run_id,
            processed = report.processed,
            discovered = report.discovered,
            "快照同步完成"
        );
        observer.on_complete(&report);
        Ok(report)
    }
}

/// 同步单行：商品查询/插入 + 日槽写入，同一事务提交
fn sync_row(conn: &mut Connection, row: &InventoryRow, anchor: SyncAnchor) -> EngineResult<RowOutcome> {
    let article = match row.article_number.as_deref() {
        Some(a) => a,
        None => return Ok(RowOutcome::Skipped),
    };

    let tx = conn.transaction()?;
    let outcome = {
        let products = ProductRepository::new(&tx);
        let (product_id, outcome) = match products.find_id_by_article(article)? {
            Some(id) => (id, RowOutcome::Existing),
            None => {
                let id = products.insert(&NewProduct::from_row(article, row))?;
                let label = row.description.clone().unwrap_or_else(|| article.to_string());
                (id, RowOutcome::Discovered(label))
            }
        };

        WeeklyRecordRepository::new(&tx).upsert_day_slot(
            product_id,
            anchor.year,
            anchor.week,
            anchor.weekday,
            row.quantity,
        )?;
        outcome
    };
    tx.commit()?;
    Ok(outcome)
}
