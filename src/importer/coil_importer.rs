// ==========================================
// 卷料库存系统 - 卷料表导入器
// ==========================================
// 职责: 整合导入流程,从文件到库存列表
// 流程: 解析 → 映射/校验 → 合并（替换/追加）
// 落库: 由调用方经 CoilRepository::update_all 整体提交
// ==========================================

use crate::domain::Coil;
use crate::importer::coil_mapper::{CoilMapper, ImportedCoil};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{FileParser, UniversalFileParser};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, instrument, warn};

/// 导入模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImportMode {
    /// 以文件内容整体替换现有库存
    Replace,
    /// 追加到现有库存（卷料号不得与现有重复）
    #[default]
    Append,
}

// ==========================================
// CoilImporter - 卷料表导入器
// ==========================================
pub struct CoilImporter {
    file_parser: Box<dyn FileParser>,
}

impl Default for CoilImporter {
    fn default() -> Self {
        Self::new(Box::new(UniversalFileParser))
    }
}

impl CoilImporter {
    pub fn new(file_parser: Box<dyn FileParser>) -> Self {
        Self { file_parser }
    }

    /// 解析并校验卷料表文件
    #[instrument(skip(self), fields(file = %file_path.display()))]
    pub fn read_file(&self, file_path: &Path) -> ImportResult<Vec<ImportedCoil>> {
        let sheet = self.file_parser.parse(file_path)?;
        let coils = CoilMapper::map_sheet(&sheet)?;
        info!(rows = sheet.rows.len(), coils = coils.len(), "卷料表解析完成");
        Ok(coils)
    }

    /// 将导入卷料与现有库存合并
    ///
    /// # 返回
    /// 合并后的完整库存列表（保持现有顺序,新卷料追加在后）
    pub fn merge(
        mode: ImportMode,
        existing: Vec<Coil>,
        imported: Vec<ImportedCoil>,
    ) -> ImportResult<Vec<Coil>> {
        match mode {
            ImportMode::Replace => {
                if !existing.is_empty() {
                    warn!(replaced = existing.len(), "替换模式: 现有库存将被整体覆盖");
                }
                Ok(imported.into_iter().map(|c| c.coil).collect())
            }
            ImportMode::Append => {
                let known: HashSet<String> = existing.iter().map(|c| c.coil_id.clone()).collect();
                let mut merged = existing;
                for item in imported {
                    if known.contains(&item.coil.coil_id) {
                        return Err(ImportError::DuplicateCoilId {
                            row: item.row,
                            coil_id: item.coil.coil_id,
                        });
                    }
                    merged.push(item.coil);
                }
                Ok(merged)
            }
        }
    }

    /// 读取文件并与现有库存合并
    pub fn import_file(
        &self,
        file_path: &Path,
        mode: ImportMode,
        existing: Vec<Coil>,
    ) -> ImportResult<Vec<Coil>> {
        let imported = self.read_file(file_path)?;
        Self::merge(mode, existing, imported)
    }
}
