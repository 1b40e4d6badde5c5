// ==========================================
// 门店库存同步系统 - 应用配置
// ==========================================
// 存储: JSON 文件（缺失字段取默认值）
// 职责: 数据库路径、低库存阈值、禁用品类、部门分组、转发间隔
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 环境变量: 数据库路径
pub const DB_PATH_ENV: &str = "INVENTORY_SYNC_DB_PATH";

/// 环境变量: 配置文件路径
pub const CONFIG_PATH_ENV: &str = "INVENTORY_SYNC_CONFIG";

pub const DEFAULT_LOW_THRESHOLD: f64 = 2.0;
pub const DEFAULT_RELAY_ITEM_DELAY_MS: u64 = 1_000;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {message}")]
    ReadError { path: String, message: String },

    #[error("配置文件格式错误 ({path}): {message}")]
    ParseError { path: String, message: String },

    #[error("配置值非法 (key: {key}): {message}")]
    InvalidValue { key: String, message: String },
}

/// 部门分组：一个指示灯对应若干原始部门名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentGroup {
    pub name: String,
    pub departments: Vec<String>,
}

impl DepartmentGroup {
    fn new(name: &str, departments: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            departments: departments.iter().map(|d| d.to_string()).collect(),
        }
    }
}

// ==========================================
// AppConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite 数据库路径
    pub db_path: String,
    /// 低库存阈值（0 < quantity <= low_threshold）
    pub low_threshold: f64,
    /// 品类以这些前缀开头的行在导入时丢弃
    pub banned_category_prefixes: Vec<String>,
    /// 部门指示灯分组（保持配置顺序）
    pub department_groups: Vec<DepartmentGroup>,
    /// 外部转发逐条间隔（毫秒）
    pub relay_item_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            low_threshold: DEFAULT_LOW_THRESHOLD,
            banned_category_prefixes: default_banned_category_prefixes(),
            department_groups: default_department_groups(),
            relay_item_delay_ms: DEFAULT_RELAY_ITEM_DELAY_MS,
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置；文件不存在时返回默认配置
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_json(&raw).map_err(|e| match e {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })?;

        tracing::info!(path = %path.display(), db_path = %config.db_path, "配置已加载");
        Ok(config)
    }

    /// 从 JSON 文本解析并校验
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(raw).map_err(|e| ConfigError::ParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "db_path".to_string(),
                message: "不能为空".to_string(),
            });
        }
        if !self.low_threshold.is_finite() || self.low_threshold < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "low_threshold".to_string(),
                message: format!("必须为非负数，实际 {}", self.low_threshold),
            });
        }
        Ok(())
    }
}

/// 默认禁用品类前缀
pub fn default_banned_category_prefixes() -> Vec<String> {
    [
        // 生鲜
        "Nuts/ Dried Fruit",
        "Fresh-",
        "Field Veg",
        "Root Veg",
        "Salad Veg",
        "Cooking Veg",
        "Peppers",
        "Tomatoes",
        // 肉类
        "Lamb",
        "Sausage",
        "Hams",
        // 文娱
        "Books-",
        "Magazines",
        "Newspapers",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// 默认部门分组
pub fn default_department_groups() -> Vec<DepartmentGroup> {
    vec![
        DepartmentGroup::new("Grocery", &["Grocery"]),
        DepartmentGroup::new("Meat", &["Meat", "Deli"]),
        DepartmentGroup::new("Bakery", &["Bakery Commercial", "Bakery Instore"]),
        DepartmentGroup::new("Dairy/Frozen", &["Bulk"]),
        DepartmentGroup::new("Seafood", &["Seafood"]),
        DepartmentGroup::new("HMR", &["HMR"]),
        DepartmentGroup::new("Produce", &["Produce"]),
        DepartmentGroup::new("Home", &["Home", "Entertainment"]),
    ]
}

/// 默认数据库路径
///
/// 优先级: 环境变量 → 用户数据目录 → 当前目录
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./inventory_sync.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("inventory-sync");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("inventory_sync.db");
        }
    }

    path.to_string_lossy().to_string()
}

/// 默认配置文件路径
pub fn default_config_path() -> PathBuf {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p.trim()),
        _ => PathBuf::from("./config.json"),
    }
}
