// ==========================================
// 卷料库存系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 输出: 表头 + 原始行（列名 → 值,保留文件行号）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::Path;

/// 原始行记录
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 文件中的行号（表头为第 1 行）
    pub row: usize,
    pub fields: HashMap<String, String>,
}

/// 解析后的表
#[derive(Debug, Clone, Default)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser: Send + Sync {
    /// 解析文件为表头 + 原始行记录
    fn parse(&self, file_path: &Path) -> ImportResult<RawSheet>;
}

fn check_file(path: &Path, allowed: &[&str]) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if !allowed.contains(&ext.as_str()) {
        return Err(ImportError::UnsupportedFormat(ext));
    }
    Ok(())
}

fn push_row(sheet: &mut RawSheet, row: usize, values: impl Iterator<Item = String>) {
    let mut fields = HashMap::new();
    for (col_idx, value) in values.enumerate() {
        if let Some(header) = sheet.headers.get(col_idx) {
            fields.insert(header.clone(), value.trim().to_string());
        }
    }

    // 跳过完全空白的行
    if fields.values().all(|v| v.is_empty()) {
        return;
    }
    sheet.rows.push(RawRow { row, fields });
}

/// 记录起始的物理行号
///
/// csv 的位置取自读取前,其后被忽略的空行需要补计
fn record_line(content: &[u8], pos: &csv::Position) -> usize {
    let mut line = pos.line() as usize;
    for &b in content.iter().skip(pos.byte() as usize) {
        match b {
            b'\n' => line += 1,
            b'\r' => {}
            _ => break,
        }
    }
    line
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse(&self, file_path: &Path) -> ImportResult<RawSheet> {
        check_file(file_path, &["csv"])?;

        let content = std::fs::read(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(content.as_slice());

        let mut sheet = RawSheet {
            headers: reader
                .headers()?
                .iter()
                .map(|h| h.trim().to_string())
                .collect(),
            rows: Vec::new(),
        };

        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let row = record
                .position()
                .map(|p| record_line(&content, p))
                .unwrap_or(idx + 2);
            push_row(&mut sheet, row, record.iter().map(str::to_string));
        }

        Ok(sheet)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse(&self, file_path: &Path) -> ImportResult<RawSheet> {
        check_file(file_path, &["xlsx", "xls"])?;

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无数据行".to_string()))?;

        let mut sheet = RawSheet {
            headers: header_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect(),
            rows: Vec::new(),
        };

        for (idx, data_row) in rows.enumerate() {
            push_row(&mut sheet, idx + 2, data_row.iter().map(|c| c.to_string()));
        }

        Ok(sheet)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse(&self, file_path: &Path) -> ImportResult<RawSheet> {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse(file_path),
            "xlsx" | "xls" => ExcelParser.parse(file_path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
