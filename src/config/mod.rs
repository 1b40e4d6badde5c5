// ==========================================
// 门店库存同步系统 - 配置层
// ==========================================
// 存储: JSON 配置文件
// ==========================================

pub mod app_config;

// 重导出核心配置
pub use app_config::{
    default_config_path, default_db_path, AppConfig, ConfigError, DepartmentGroup,
};
