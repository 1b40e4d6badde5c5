// ==========================================
// 门店库存同步系统 - 排除清单仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 只有插入与 active 切换，没有删除
// ==========================================

use crate::domain::exclusion::ExclusionEntry;
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::collections::BTreeSet;

pub struct ExclusionRepository<'c> {
    conn: &'c Connection,
}

impl<'c> ExclusionRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 按货号查询条目
    pub fn find(&self, article: &str) -> RepositoryResult<Option<ExclusionEntry>> {
        let entry = self
            .conn
            .query_row(
                "SELECT article, active FROM exclusion_entry WHERE article = ?1",
                params![article],
                |row| {
                    Ok(ExclusionEntry {
                        article: row.get(0)?,
                        active: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    /// 插入激活条目，已存在时不做任何修改；返回影响行数
    pub fn insert_active_if_absent(&self, article: &str) -> RepositoryResult<usize> {
        let n = self.conn.execute(
            "INSERT INTO exclusion_entry (article, active) VALUES (?1, 1) \
             ON CONFLICT(article) DO NOTHING",
            params![article],
        )?;
        Ok(n)
    }

    /// 设置 active；返回影响行数
    pub fn set_active(&self, article: &str, active: bool) -> RepositoryResult<usize> {
        let n = self.conn.execute(
            "UPDATE exclusion_entry SET active = ?2 WHERE article = ?1",
            params![article, active],
        )?;
        Ok(n)
    }

    /// 仅停用当前激活的条目；返回影响行数（0 = 不存在或已停用）
    pub fn deactivate_if_active(&self, article: &str) -> RepositoryResult<usize> {
        let n = self.conn.execute(
            "UPDATE exclusion_entry SET active = 0 WHERE article = ?1 AND active = 1",
            params![article],
        )?;
        Ok(n)
    }

    /// 全部激活的货号
    pub fn list_active(&self) -> RepositoryResult<BTreeSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT article FROM exclusion_entry WHERE active = 1")?;
        let articles = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<BTreeSet<_>>>()?;
        Ok(articles)
    }

    /// 条目总数（含停用）
    pub fn count(&self) -> RepositoryResult<i64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM exclusion_entry", [], |row| row.get(0))?;
        Ok(n)
    }
}
