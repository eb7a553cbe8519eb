// ==========================================
// 卷料库存系统 - 卷料字段映射器
// ==========================================
// 职责: 原始行 → Coil 映射 + 类型转换 + 数据质量校验
// 别名: 列名不区分大小写,忽略空格/下划线/短横线
// ==========================================

use crate::domain::Coil;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRow, RawSheet};
use std::collections::{HashMap, HashSet};

/// 映射后的卷料（保留源文件行号）
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedCoil {
    pub row: usize,
    pub coil: Coil,
}

// 标准字段 → 可接受的列名（已规范化）
const COIL_ID_ALIASES: &[&str] = &["coilid", "coil", "id", "coilno", "卷料号"];
const MATERIAL_ALIASES: &[&str] = &["material", "mat", "grade", "材质"];
const FOOTAGE_ALIASES: &[&str] = &["footage", "feet", "ft", "remainingfootage", "剩余英尺"];
const LOCATION_ALIASES: &[&str] = &["location", "loc", "bay", "库位"];
const STATUS_ALIASES: &[&str] = &["status", "状态"];

fn normalize_header(header: &str) -> String {
    header
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

pub struct CoilMapper {
    // 标准字段 → 源文件实际列名
    columns: HashMap<&'static str, String>,
}

impl CoilMapper {
    /// 根据表头解析列映射
    ///
    /// coil_id 与 footage 为必需列,缺失时返回 MissingColumn
    pub fn from_headers(headers: &[String]) -> ImportResult<Self> {
        let mut columns = HashMap::new();
        let fields: [(&'static str, &[&str]); 5] = [
            ("coil_id", COIL_ID_ALIASES),
            ("material", MATERIAL_ALIASES),
            ("footage", FOOTAGE_ALIASES),
            ("location", LOCATION_ALIASES),
            ("status", STATUS_ALIASES),
        ];

        for (field, aliases) in fields {
            // 同一字段多列命中时取第一列
            if let Some(header) = headers
                .iter()
                .find(|h| aliases.contains(&normalize_header(h).as_str()))
            {
                columns.insert(field, header.clone());
            }
        }

        for required in ["coil_id", "footage"] {
            if !columns.contains_key(required) {
                return Err(ImportError::MissingColumn(required.to_string()));
            }
        }

        Ok(Self { columns })
    }

    fn get_string(&self, row: &RawRow, field: &str) -> String {
        self.columns
            .get(field)
            .and_then(|header| row.fields.get(header))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    /// 映射单行
    pub fn map_row(&self, row: &RawRow) -> ImportResult<ImportedCoil> {
        let coil_id = self.get_string(row, "coil_id");
        if coil_id.is_empty() {
            return Err(ImportError::PrimaryKeyMissing(row.row));
        }

        let raw_footage = self.get_string(row, "footage");
        if raw_footage.is_empty() {
            return Err(ImportError::TypeConversionError {
                row: row.row,
                field: "footage".to_string(),
                message: "值为空".to_string(),
            });
        }
        // 允许千分位逗号: "1,250.5"
        let footage = raw_footage
            .replace(',', "")
            .parse::<f64>()
            .map_err(|e| ImportError::TypeConversionError {
                row: row.row,
                field: "footage".to_string(),
                message: format!("无法解析 '{}': {}", raw_footage, e),
            })?;
        if !footage.is_finite() || footage < 0.0 {
            return Err(ImportError::InvalidValue {
                row: row.row,
                field: "footage".to_string(),
                value: raw_footage,
            });
        }

        let coil = Coil::new(
            coil_id,
            self.get_string(row, "material"),
            footage,
            self.get_string(row, "location"),
        )
        .with_status(self.get_string(row, "status"));

        Ok(ImportedCoil { row: row.row, coil })
    }

    /// 映射整张表（遇到第一条错误即返回,批内卷料号不得重复）
    pub fn map_sheet(sheet: &RawSheet) -> ImportResult<Vec<ImportedCoil>> {
        let mapper = Self::from_headers(&sheet.headers)?;
        let mut seen = HashSet::new();
        let mut coils = Vec::with_capacity(sheet.rows.len());

        for row in &sheet.rows {
            let imported = mapper.map_row(row)?;
            if !seen.insert(imported.coil.coil_id.clone()) {
                return Err(ImportError::DuplicateCoilId {
                    row: imported.row,
                    coil_id: imported.coil.coil_id,
                });
            }
            coils.push(imported);
        }

        Ok(coils)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(headers: &[&str], rows: &[&[&str]]) -> RawSheet {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let rows = rows
            .iter()
            .enumerate()
            .map(|(idx, values)| RawRow {
                row: idx + 2,
                fields: headers
                    .iter()
                    .cloned()
                    .zip(values.iter().map(|v| v.to_string()))
                    .collect(),
            })
            .collect();
        RawSheet { headers, rows }
    }

    #[test]
    fn test_header_aliases() {
        let s = sheet(
            &["Coil ID", "Material", "Feet", "Bay", "Status"],
            &[&["C1", "Galvalume", "1,250.5", "A-1", "open"]],
        );
        let coils = CoilMapper::map_sheet(&s).unwrap();
        assert_eq!(coils.len(), 1);
        assert_eq!(coils[0].row, 2);
        assert_eq!(coils[0].coil.coil_id, "C1");
        assert_eq!(coils[0].coil.material, "Galvalume");
        assert_eq!(coils[0].coil.footage, 1250.5);
        assert_eq!(coils[0].coil.location, "A-1");
        assert_eq!(coils[0].coil.status, "open");
    }

    #[test]
    fn test_missing_required_column() {
        let s = sheet(&["coil_id", "location"], &[&["C1", "A"]]);
        assert!(matches!(
            CoilMapper::map_sheet(&s),
            Err(ImportError::MissingColumn(col)) if col == "footage"
        ));
    }

    #[test]
    fn test_missing_coil_id_reports_row() {
        let s = sheet(&["id", "footage"], &[&["C1", "10"], &["", "20"]]);
        assert!(matches!(
            CoilMapper::map_sheet(&s),
            Err(ImportError::PrimaryKeyMissing(3))
        ));
    }

    #[test]
    fn test_non_numeric_footage() {
        let s = sheet(&["id", "footage"], &[&["C1", "abc"]]);
        assert!(matches!(
            CoilMapper::map_sheet(&s),
            Err(ImportError::TypeConversionError { row: 2, .. })
        ));
    }

    #[test]
    fn test_negative_footage() {
        let s = sheet(&["id", "footage"], &[&["C1", "-5"]]);
        assert!(matches!(
            CoilMapper::map_sheet(&s),
            Err(ImportError::InvalidValue { row: 2, .. })
        ));
    }

    #[test]
    fn test_duplicate_coil_id() {
        let s = sheet(&["id", "footage"], &[&["C1", "5"], &["C2", "5"], &["C1", "7"]]);
        match CoilMapper::map_sheet(&s) {
            Err(ImportError::DuplicateCoilId { row, coil_id }) => {
                assert_eq!(row, 4);
                assert_eq!(coil_id, "C1");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
