// ==========================================
// 门店库存同步系统 - 货号转发
// ==========================================
// 职责: 将分类结果逐条交给外部录入端（如补货系统窗口）
// 说明: 录入端本身不在本系统范围内，这里只定义顺序消费接口
//       以队列迭代消费，条目之间固定间隔
// ==========================================

use crate::engine::error::EngineResult;
use std::collections::VecDeque;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, instrument};

// ==========================================
// ArticleRelay Trait
// ==========================================
pub trait ArticleRelay {
    /// 提交一个货号
    fn submit(&mut self, article: &str) -> EngineResult<()>;
}

/// 记录提交顺序的转发端（测试/演练）
#[derive(Debug, Clone, Default)]
pub struct RecordingRelay {
    pub submitted: Vec<String>,
}

impl ArticleRelay for RecordingRelay {
    fn submit(&mut self, article: &str) -> EngineResult<()> {
        self.submitted.push(article.to_string());
        Ok(())
    }
}

// ==========================================
// RelayDispatcher
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct RelayDispatcher {
    item_delay: Duration,
}

impl RelayDispatcher {
    pub fn new(item_delay: Duration) -> Self {
        Self { item_delay }
    }

    pub fn from_millis(item_delay_ms: u64) -> Self {
        Self::new(Duration::from_millis(item_delay_ms))
    }

    pub fn item_delay(&self) -> Duration {
        self.item_delay
    }

    /// 预计耗时（n 条之间共 n-1 个间隔）
    pub fn estimated_duration(&self, items: usize) -> Duration {
        let gaps = items.saturating_sub(1).min(u32::MAX as usize) as u32;
        self.item_delay.saturating_mul(gaps)
    }

    /// 依次提交全部货号，空白条目跳过
    ///
    /// # 返回
    /// - Ok(n): 实际提交条数
    /// - Err: 首个失败条目的错误，后续条目不再提交
    #[instrument(skip(self, relay, articles))]
    pub fn dispatch<R, I>(&self, relay: &mut R, articles: I) -> EngineResult<usize>
    where
        R: ArticleRelay + ?Sized,
        I: IntoIterator<Item = String>,
    {
        let mut queue: VecDeque<String> = articles
            .into_iter()
            .filter(|a| !a.trim().is_empty())
            .collect();
        let total = queue.len();
        info!(
            total,
            eta_ms = self.estimated_duration(total).as_millis() as u64,
            "开始转发货号"
        );

        let mut sent = 0;
        while let Some(article) = queue.pop_front() {
            relay.submit(article.trim())?;
            sent += 1;
            debug!(article = %article, sent, total, "货号已提交");

            if !queue.is_empty() && !self.item_delay.is_zero() {
                thread::sleep(self.item_delay);
            }
        }

        info!(sent, "货号转发完成");
        Ok(sent)
    }
}
