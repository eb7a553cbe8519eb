// ==========================================
// 卷料库存系统 - 规格目录
// ==========================================
// 职责: 规格标签 → 单件耗用宽度（英寸）
// 红线: 进程启动后不可变,查询为纯函数
// ==========================================

use crate::engine::error::AllocationError;

/// 标准规格表（标签, 单件宽度英寸）
pub const STANDARD_SIZES: [(&str, f64); 11] = [
    ("2x2", 13.0),
    ("2x3", 15.0),
    ("3x3", 18.0),
    ("3x4", 20.0),
    ("4x4", 22.5),
    ("4x5", 25.0),
    ("5x5", 27.5),
    ("5x6", 30.0),
    ("6x6", 32.5),
    ("6x8", 36.0),
    ("8x8", 39.5),
];

// ==========================================
// SizeCatalog - 规格目录
// ==========================================
#[derive(Debug, Clone)]
pub struct SizeCatalog {
    entries: Vec<(String, f64)>,
}

impl SizeCatalog {
    /// 标准规格目录
    pub fn standard() -> Self {
        Self::from_entries(
            STANDARD_SIZES
                .iter()
                .map(|(label, width)| (label.to_string(), *width)),
        )
    }

    /// 从自定义条目构建（后出现的同名标签被忽略）
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut deduped: Vec<(String, f64)> = Vec::new();
        for (label, width) in entries {
            let label = label.trim().to_string();
            if !deduped.iter().any(|(l, _)| *l == label) {
                deduped.push((label, width));
            }
        }
        Self { entries: deduped }
    }

    /// 查询单件宽度（英寸）
    pub fn width_inches(&self, size: &str) -> Result<f64, AllocationError> {
        let key = size.trim();
        self.entries
            .iter()
            .find(|(label, _)| label == key)
            .map(|(_, width)| *width)
            .ok_or_else(|| AllocationError::UnknownSize(size.to_string()))
    }

    pub fn contains(&self, size: &str) -> bool {
        self.width_inches(size).is_ok()
    }

    /// 规格标签（按表顺序）
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(l, _)| l.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SizeCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
