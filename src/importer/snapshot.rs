// ==========================================
// 门店库存同步系统 - 当前库存快照
// ==========================================
// 职责: 会话内合并所有上传批次，每个货号只保留一行
// 规则: 同货号后上传的行覆盖先前的行（位置保持不变）
// 说明: 缺失货号的行共享同一个键，同样只保留最后一行
// ==========================================

use crate::domain::inventory::InventoryRow;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct CurrentSnapshot {
    rows: Vec<InventoryRow>,
    index: HashMap<Option<String>, usize>,
}

/// 单行合并结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Added,
    Replaced,
}

impl CurrentSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 按快照顺序返回所有行
    pub fn rows(&self) -> &[InventoryRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InventoryRow> {
        self.rows.iter()
    }

    pub fn get(&self, article_number: &str) -> Option<&InventoryRow> {
        self.index
            .get(&Some(article_number.to_string()))
            .map(|&i| &self.rows[i])
    }

    /// 合并一行（后到者覆盖）
    pub(crate) fn merge(&mut self, row: InventoryRow) -> MergeOutcome {
        let key = row.article_number.clone();
        match self.index.get(&key) {
            Some(&i) => {
                self.rows[i] = row;
                MergeOutcome::Replaced
            }
            None => {
                self.index.insert(key, self.rows.len());
                self.rows.push(row);
                MergeOutcome::Added
            }
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.index.clear();
    }
}

impl<'a> IntoIterator for &'a CurrentSnapshot {
    type Item = &'a InventoryRow;
    type IntoIter = std::slice::Iter<'a, InventoryRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
