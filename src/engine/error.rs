// ==========================================
// 门店库存同步系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 下层错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Import(#[from] ImportError),

    // ===== 业务前置条件 =====
    #[error("当前没有已加载的库存快照，请先上传表格")]
    EmptyInventory,

    #[error("商品不存在: article={article}")]
    ProductNotFound { article: String },

    #[error("输入非法: {0}")]
    InvalidInput(String),

    // ===== 外部协作方 =====
    #[error("转发失败 (article={article}): {message}")]
    Relay { article: String, message: String },

    #[error("后台任务失败: {0}")]
    TaskFailed(String),
}

impl EngineError {
    /// 是否为数据库连接类错误
    pub fn is_connection_error(&self) -> bool {
        matches!(self, EngineError::Repository(e) if e.is_connection_error())
    }
}

// 实现 From<rusqlite::Error>（事务开启/提交）
impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        EngineError::Repository(RepositoryError::from(err))
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
