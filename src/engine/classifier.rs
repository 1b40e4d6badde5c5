// ==========================================
// 门店库存同步系统 - 库存分类器
// ==========================================
// 职责: 由当前快照推导零库存/低库存货号集合
// 规则: 集合只增不减（本会话内累积），需显式 reset 清空
// 说明: 库存回升的货号不会自动移出集合
// ==========================================

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::exclusion_registry::ExclusionLookup;
use crate::importer::snapshot::CurrentSnapshot;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::info;

/// 累积的分类结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationSets {
    pub zero_stock: BTreeSet<String>,
    pub low_stock: BTreeSet<String>,
}

impl ClassificationSets {
    pub fn reset(&mut self) {
        self.zero_stock.clear();
        self.low_stock.clear();
    }
}

#[derive(Debug, Clone, Default)]
pub struct InventoryClassifier {
    sets: ClassificationSets,
}

impl InventoryClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sets(&self) -> &ClassificationSets {
        &self.sets
    }

    pub fn zero_stock(&self) -> &BTreeSet<String> {
        &self.sets.zero_stock
    }

    pub fn low_stock(&self) -> &BTreeSet<String> {
        &self.sets.low_stock
    }

    /// 清空两个集合
    pub fn reset(&mut self) {
        info!(
            zero = self.sets.zero_stock.len(),
            low = self.sets.low_stock.len(),
            "分类集合已清空"
        );
        self.sets.reset();
    }

    /// 零库存分类：quantity <= 0 且不在激活的排除清单中
    ///
    /// 排除集合读取失败时集合保持不变
    pub fn classify_zero(
        &mut self,
        snapshot: &CurrentSnapshot,
        exclusions: &dyn ExclusionLookup,
    ) -> EngineResult<&BTreeSet<String>> {
        if snapshot.is_empty() {
            return Err(EngineError::EmptyInventory);
        }
        let excluded = exclusions.active_exclusions()?;

        let before = self.sets.zero_stock.len();
        let found = snapshot
            .iter()
            .filter(|row| row.is_zero_stock())
            .filter_map(|row| row.article_number.as_ref())
            .filter(|article| !excluded.contains(article.as_str()))
            .cloned();
        self.sets.zero_stock.extend(found);

        info!(
            total = self.sets.zero_stock.len(),
            added = self.sets.zero_stock.len() - before,
            excluded = excluded.len(),
            "零库存分类完成"
        );
        Ok(&self.sets.zero_stock)
    }

    /// 低库存分类：0 < quantity <= threshold
    pub fn classify_low(
        &mut self,
        snapshot: &CurrentSnapshot,
        threshold: f64,
    ) -> EngineResult<&BTreeSet<String>> {
        if snapshot.is_empty() {
            return Err(EngineError::EmptyInventory);
        }
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "低库存阈值必须为非负数，实际 {}",
                threshold
            )));
        }

        let before = self.sets.low_stock.len();
        let found = snapshot
            .iter()
            .filter(|row| row.is_low_stock(threshold))
            .filter_map(|row| row.article_number.clone());
        self.sets.low_stock.extend(found);

        info!(
            total = self.sets.low_stock.len(),
            added = self.sets.low_stock.len() - before,
            threshold,
            "低库存分类完成"
        );
        Ok(&self.sets.low_stock)
    }
}
