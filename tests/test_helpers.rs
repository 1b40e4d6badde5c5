// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试表格生成等功能
// ==========================================
#![allow(dead_code)]

use inventory_sync::config::AppConfig;
use inventory_sync::db::ConnectionFactory;
use inventory_sync::importer::RawSheet;
use std::error::Error;
use std::path::PathBuf;
use tempfile::TempDir;

/// 上传表格的标准表头
pub const HEADERS: [&str; 5] = [
    "Department",
    "Merchandise Category",
    "Article Description",
    "Article",
    "Inventory",
];

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - TempDir: 临时目录（需要保持存活）
/// - ConnectionFactory: 指向目录内数据库文件
pub fn create_test_db() -> Result<(TempDir, ConnectionFactory), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("inventory_sync.db");
    let factory = ConnectionFactory::new(db_path.to_string_lossy().into_owned());
    factory.bootstrap()?;
    Ok((dir, factory))
}

/// 测试配置：指向临时数据库，转发无间隔
pub fn test_config(factory: &ConnectionFactory) -> AppConfig {
    AppConfig {
        db_path: factory.db_path().to_string(),
        relay_item_delay_ms: 0,
        ..AppConfig::default()
    }
}

/// 单行测试数据
pub struct TestRow<'a> {
    pub department: &'a str,
    pub category: &'a str,
    pub description: &'a str,
    pub article: &'a str,
    pub quantity: &'a str,
}

impl<'a> TestRow<'a> {
    pub fn new(article: &'a str, quantity: &'a str) -> Self {
        Self {
            department: "Grocery",
            category: "Dairy",
            description: "Test item",
            article,
            quantity,
        }
    }

    pub fn described(mut self, description: &'a str) -> Self {
        self.description = description;
        self
    }

    pub fn in_category(mut self, category: &'a str) -> Self {
        self.category = category;
        self
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.department.to_string(),
            self.category.to_string(),
            self.description.to_string(),
            self.article.to_string(),
            self.quantity.to_string(),
        ]
    }
}

/// 构造内存批次
pub fn sheet(rows: &[TestRow<'_>]) -> RawSheet {
    RawSheet::from_rows(&HEADERS, rows.iter().map(TestRow::values))
}

/// 写出 CSV 测试文件
pub fn write_csv(
    dir: &TempDir,
    name: &str,
    rows: &[TestRow<'_>],
) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.path().join(name);
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(HEADERS)?;
    for row in rows {
        writer.write_record(row.values())?;
    }
    writer.flush()?;
    Ok(path)
}
