// ==========================================
// 门店库存同步系统 - 表格导入器
// ==========================================
// 流程: 解析 → 必需列校验 → 部门指示灯 → 禁用品类过滤 → 映射 → 合并快照
// 红线: 必需列缺失时整个批次拒绝，不产生任何状态变更
// ==========================================

use crate::config::{AppConfig, DepartmentGroup};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{columns, FieldMapper};
use crate::importer::file_parser::{FileParser, RawSheet, UniversalFileParser};
use crate::importer::snapshot::{CurrentSnapshot, MergeOutcome};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// 单批次导入汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub received: usize,       // 批次总行数
    pub dropped_banned: usize, // 命中禁用品类被丢弃
    pub added: usize,          // 新货号
    pub replaced: usize,       // 覆盖已有货号
}

/// 部门指示灯
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentLight {
    pub group: String,
    pub observed: bool,
}

// ==========================================
// SpreadsheetIngestor
// ==========================================
pub struct SpreadsheetIngestor {
    banned_category_prefixes: Vec<String>,
    department_groups: Vec<DepartmentGroup>,
    observed_groups: BTreeSet<String>,
    snapshot: CurrentSnapshot,
    file_parser: Box<dyn FileParser>,
    field_mapper: FieldMapper,
}

impl SpreadsheetIngestor {
    pub fn new(banned_category_prefixes: Vec<String>, department_groups: Vec<DepartmentGroup>) -> Self {
        Self {
            banned_category_prefixes,
            department_groups,
            observed_groups: BTreeSet::new(),
            snapshot: CurrentSnapshot::new(),
            file_parser: Box::new(UniversalFileParser),
            field_mapper: FieldMapper,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.banned_category_prefixes.clone(),
            config.department_groups.clone(),
        )
    }

    /// 替换文件解析器
    pub fn with_file_parser(mut self, file_parser: Box<dyn FileParser>) -> Self {
        self.file_parser = file_parser;
        self
    }

    pub fn snapshot(&self) -> &CurrentSnapshot {
        &self.snapshot
    }

    /// 解析文件并导入
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub fn ingest_file<P: AsRef<Path>>(&mut self, file_path: P) -> ImportResult<IngestSummary> {
        let sheet = self.file_parser.parse_to_raw_sheet(file_path.as_ref())?;
        debug!(rows = sheet.rows.len(), "文件解析完成");
        self.ingest(&sheet)
    }

    /// 导入一个原始批次并合并到当前快照
    pub fn ingest(&mut self, sheet: &RawSheet) -> ImportResult<IngestSummary> {
        // === 步骤 1: 必需列校验（失败即返回，无任何变更） ===
        let missing: Vec<String> = columns::REQUIRED
            .iter()
            .filter(|c| !sheet.has_column(c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            warn!(missing = ?missing, "上传表格缺少必需列");
            return Err(ImportError::SchemaError { missing });
        }

        // === 步骤 2: 部门指示灯 ===
        for raw in &sheet.rows {
            if let Some(dep) = raw.get(columns::DEPARTMENT) {
                self.mark_department(dep.trim());
            }
        }

        // === 步骤 3: 过滤 + 合并 ===
        let mut summary = IngestSummary {
            received: sheet.rows.len(),
            ..IngestSummary::default()
        };
        for raw in &sheet.rows {
            let row = self.field_mapper.map_row(raw);
            if row.has_banned_category(&self.banned_category_prefixes) {
                summary.dropped_banned += 1;
                continue;
            }
            match self.snapshot.merge(row) {
                MergeOutcome::Added => summary.added += 1,
                MergeOutcome::Replaced => summary.replaced += 1,
            }
        }

        info!(
            received = summary.received,
            dropped_banned = summary.dropped_banned,
            added = summary.added,
            replaced = summary.replaced,
            snapshot_rows = self.snapshot.len(),
            "批次已合并到当前快照"
        );
        Ok(summary)
    }

    fn mark_department(&mut self, department: &str) {
        if let Some(group) = self
            .department_groups
            .iter()
            .find(|g| g.departments.iter().any(|d| d == department))
        {
            if self.observed_groups.insert(group.name.clone()) {
                debug!(group = %group.name, "部门已出现");
            }
        }
    }

    /// 全部部门指示灯（按配置顺序）
    pub fn department_lights(&self) -> Vec<DepartmentLight> {
        self.department_groups
            .iter()
            .map(|g| DepartmentLight {
                group: g.name.clone(),
                observed: self.observed_groups.contains(&g.name),
            })
            .collect()
    }
}
