// ==========================================
// 门店库存同步系统 - 导入层
// ==========================================
// 职责: 上传表格 → 会话内当前快照
// 支持: Excel, CSV
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod ingestor;
pub mod snapshot;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::{columns, FieldMapper};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawSheet, UniversalFileParser};
pub use ingestor::{DepartmentLight, IngestSummary, SpreadsheetIngestor};
pub use snapshot::{CurrentSnapshot, MergeOutcome};
