// ==========================================
// 门店库存同步系统 - 排除清单
// ==========================================
// 职责: 激活/停用/列出不再补货的货号
// 约束: 每个操作独立获取连接，单事务完成，用完即释放
// ==========================================

use crate::db::ConnectionFactory;
use crate::domain::inventory::normalize_article_number;
use crate::domain::types::{ActivateOutcome, DeactivateOutcome};
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::error::RepositoryError;
use crate::repository::ExclusionRepository;
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, instrument};

// ==========================================
// ExclusionLookup Trait
// ==========================================
// 零库存分类只依赖“当前激活的排除集合”
pub trait ExclusionLookup {
    fn active_exclusions(&self) -> EngineResult<BTreeSet<String>>;
}

/// 固定集合（测试或离线场景）
impl ExclusionLookup for BTreeSet<String> {
    fn active_exclusions(&self) -> EngineResult<BTreeSet<String>> {
        Ok(self.clone())
    }
}

// ==========================================
// ExclusionRegistry
// ==========================================
#[derive(Debug, Clone)]
pub struct ExclusionRegistry {
    connections: ConnectionFactory,
}

impl ExclusionRegistry {
    pub fn new(connections: ConnectionFactory) -> Self {
        Self { connections }
    }

    /// 激活货号（不存在则插入）
    ///
    /// # 返回
    /// - Inserted: 之前没有该行
    /// - AlreadyActive: 已存在且已激活
    /// - Reactivated: 已存在但处于停用状态
    #[instrument(skip(self))]
    pub fn activate(&self, article: &str) -> EngineResult<ActivateOutcome> {
        let article = normalize_input(article)?;

        let outcome = self.connections.with_connection(|conn| {
            let tx = conn.transaction()?;
            let outcome = {
                let repo = ExclusionRepository::new(&tx);
                match repo.find(&article)? {
                    None => {
                        repo.insert_active_if_absent(&article)?;
                        ActivateOutcome::Inserted
                    }
                    Some(entry) if entry.active => ActivateOutcome::AlreadyActive,
                    Some(_) => {
                        repo.set_active(&article, true)?;
                        ActivateOutcome::Reactivated
                    }
                }
            };
            tx.commit()?;
            Ok::<_, EngineError>(outcome)
        })?;

        info!(article = %article, outcome = %outcome, "排除清单已激活");
        Ok(outcome)
    }

    /// 停用货号（仅对已存在且激活的行生效）
    #[instrument(skip(self))]
    pub fn deactivate(&self, article: &str) -> EngineResult<DeactivateOutcome> {
        let article = normalize_input(article)?;

        let affected = self.connections.with_connection(|conn| {
            ExclusionRepository::new(conn).deactivate_if_active(&article)
        })?;

        let outcome = if affected > 0 {
            DeactivateOutcome::Deactivated
        } else {
            DeactivateOutcome::NotFoundOrAlreadyInactive
        };
        info!(article = %article, outcome = %outcome, "排除清单停用");
        Ok(outcome)
    }

    /// 当前激活的全部货号
    pub fn list_active(&self) -> EngineResult<BTreeSet<String>> {
        let articles = self
            .connections
            .with_connection(|conn| ExclusionRepository::new(conn).list_active())?;
        Ok(articles)
    }

    /// 从旧版本地 SQLite 文件（dno 表）迁移排除清单
    ///
    /// 已存在的货号保持原状态不变；返回新增行数
    #[instrument(skip(self, legacy_path), fields(legacy = %legacy_path.as_ref().display()))]
    pub fn import_legacy<P: AsRef<Path>>(&self, legacy_path: P) -> EngineResult<usize> {
        let legacy_path = legacy_path.as_ref();
        let articles = read_legacy_articles(legacy_path)?;
        info!(fetched = articles.len(), "已读取旧版排除清单");

        let inserted = self.connections.with_connection(|conn| {
            let tx = conn.transaction()?;
            let mut inserted = 0;
            {
                let repo = ExclusionRepository::new(&tx);
                for article in &articles {
                    inserted += repo.insert_active_if_absent(article)?;
                }
            }
            tx.commit()?;
            Ok::<_, EngineError>(inserted)
        })?;

        info!(inserted, "旧版排除清单迁移完成");
        Ok(inserted)
    }
}

impl ExclusionLookup for ExclusionRegistry {
    fn active_exclusions(&self) -> EngineResult<BTreeSet<String>> {
        self.list_active()
    }
}

fn normalize_input(article: &str) -> EngineResult<String> {
    normalize_article_number(article)
        .ok_or_else(|| EngineError::InvalidInput("货号不能为空".to_string()))
}

fn read_legacy_articles(path: &Path) -> EngineResult<Vec<String>> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(
        |e| RepositoryError::ConnectionError(format!("{}: {}", path.display(), e)),
    )?;

    let mut stmt = conn.prepare("SELECT article FROM dno")?;
    let values = stmt
        .query_map([], |row| row.get::<_, Value>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    // 旧库中的货号可能以整数/浮点/文本任意形式存储
    let articles = values
        .into_iter()
        .filter_map(|v| match v {
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(f) => normalize_article_number(&f.to_string()),
            Value::Text(s) => normalize_article_number(&s),
            Value::Null | Value::Blob(_) => None,
        })
        .collect();
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry(dir: &TempDir) -> ExclusionRegistry {
        let factory = ConnectionFactory::new(dir.path().join("inv.db").to_str().unwrap());
        factory.bootstrap().unwrap();
        ExclusionRegistry::new(factory)
    }

    #[test]
    fn test_activate_outcomes() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);

        assert_eq!(registry.activate("100").unwrap(), ActivateOutcome::Inserted);
        assert_eq!(registry.activate("100").unwrap(), ActivateOutcome::AlreadyActive);
        assert_eq!(registry.deactivate("100").unwrap(), DeactivateOutcome::Deactivated);
        assert_eq!(registry.activate("100").unwrap(), ActivateOutcome::Reactivated);
    }

    #[test]
    fn test_deactivate_unknown_or_inactive() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);

        assert_eq!(
            registry.deactivate("404").unwrap(),
            DeactivateOutcome::NotFoundOrAlreadyInactive
        );
        registry.activate("404").unwrap();
        registry.deactivate("404").unwrap();
        assert_eq!(
            registry.deactivate("404").unwrap(),
            DeactivateOutcome::NotFoundOrAlreadyInactive
        );
    }

    #[test]
    fn test_blank_article_rejected() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        assert!(matches!(
            registry.activate("   "),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_input_is_normalized() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        registry.activate(" 100.0 ").unwrap();
        let active = registry.list_active().unwrap();
        assert!(active.contains("100"));
    }

    #[test]
    fn test_unreachable_store_is_connection_error() {
        let dir = TempDir::new().unwrap();
        let factory =
            ConnectionFactory::new(dir.path().join("nope").join("inv.db").to_str().unwrap());
        let registry = ExclusionRegistry::new(factory);

        let err = registry.activate("1").unwrap_err();
        assert!(err.is_connection_error());
        assert!(registry.list_active().unwrap_err().is_connection_error());
    }

    #[test]
    fn test_import_legacy_keeps_existing_state() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);

        let legacy_path = dir.path().join("dno.db");
        {
            let legacy = Connection::open(&legacy_path).unwrap();
            legacy
                .execute_batch(
                    "CREATE TABLE dno (article);
                     INSERT INTO dno VALUES (100);
                     INSERT INTO dno VALUES ('200');
                     INSERT INTO dno VALUES (300.0);
                     INSERT INTO dno VALUES (NULL);",
                )
                .unwrap();
        }

        registry.activate("200").unwrap();
        registry.deactivate("200").unwrap();

        let inserted = registry.import_legacy(&legacy_path).unwrap();
        assert_eq!(inserted, 2);

        let active = registry.list_active().unwrap();
        let expected: BTreeSet<String> = ["100", "300"].iter().map(|s| s.to_string()).collect();
        assert_eq!(active, expected);
    }
}
