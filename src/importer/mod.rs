// ==========================================
// 卷料库存系统 - 导入层
// ==========================================
// 职责: 外部卷料表导入,生成库存列表
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod coil_importer;
pub mod coil_mapper;
pub mod error;
pub mod file_parser;

// 重导出核心类型
pub use coil_importer::{CoilImporter, ImportMode};
pub use coil_mapper::{CoilMapper, ImportedCoil};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRow, RawSheet, UniversalFileParser};
