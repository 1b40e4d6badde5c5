// ==========================================
// 门店库存同步系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 建表（products / weekly_inventory_record / exclusion_entry）
// - 按操作获取连接：获取 → 使用 → 释放，不持有长期共享句柄
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_number TEXT NOT NULL UNIQUE,
    description TEXT,
    department TEXT,
    category TEXT
);

CREATE TABLE IF NOT EXISTS weekly_inventory_record (
    product_id INTEGER NOT NULL REFERENCES products(id),
    year INTEGER NOT NULL,
    week INTEGER NOT NULL,
    d0_inventory REAL,
    d1_inventory REAL,
    d2_inventory REAL,
    d3_inventory REAL,
    d4_inventory REAL,
    d5_inventory REAL,
    d6_inventory REAL,
    PRIMARY KEY (product_id, year, week)
);

CREATE INDEX IF NOT EXISTS idx_weekly_record_product_week
  ON weekly_inventory_record(product_id, week);

CREATE TABLE IF NOT EXISTS exclusion_entry (
    article TEXT PRIMARY KEY,
    active INTEGER NOT NULL DEFAULT 1
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）并写入 schema_version
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

// ==========================================
// ConnectionFactory - 按操作获取连接
// ==========================================
// 每次 acquire 都打开独立连接；调用方用完即释放（drop）
// 获取失败立即返回 ConnectionError，不做重试
#[derive(Debug, Clone)]
pub struct ConnectionFactory {
    db_path: String,
}

impl ConnectionFactory {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// 获取一个新连接
    pub fn acquire(&self) -> RepositoryResult<Connection> {
        open_sqlite_connection(&self.db_path).map_err(|e| {
            tracing::warn!(db_path = %self.db_path, error = %e, "数据库连接失败");
            RepositoryError::ConnectionError(format!("{}: {}", self.db_path, e))
        })
    }

    /// 建表并检查 schema 版本
    pub fn bootstrap(&self) -> RepositoryResult<()> {
        let conn = self.acquire()?;
        ensure_schema(&conn)?;

        match read_schema_version(&conn)? {
            Some(v) if v == CURRENT_SCHEMA_VERSION => {}
            Some(v) => tracing::warn!(
                found = v,
                expected = CURRENT_SCHEMA_VERSION,
                "schema_version 与当前代码不一致"
            ),
            None => tracing::warn!("schema_version 表不存在"),
        }

        tracing::debug!(db_path = %self.db_path, "数据库 schema 已就绪");
        Ok(())
    }

    /// 获取连接并在闭包内使用，闭包返回后连接即释放
    pub fn with_connection<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Connection) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut conn = self.acquire()?;
        f(&mut conn)
    }
}
