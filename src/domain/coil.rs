// ==========================================
// 卷料库存系统 - 卷料领域模型
// ==========================================
// 职责: 定义库存卷料实体
// 红线: footage 任何时刻不得为负（含提交后的瞬时状态）
// 对齐: coil_inventory 表
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Coil - 库存卷料
// ==========================================
// 用途: 库存源加载,引擎扣料,管理员覆写
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coil {
    // ===== 主键 =====
    pub coil_id: String, // 卷料唯一标识

    // ===== 基础信息 =====
    pub material: String, // 材质（已知材质目录或自由文本）
    pub footage: f64,     // 剩余英尺数（>= 0）
    pub location: String, // 库位（区/排/层 自由编码）
    pub status: String,   // 状态（仅展示用）
}

impl Coil {
    /// 创建新的卷料记录
    pub fn new(
        coil_id: impl Into<String>,
        material: impl Into<String>,
        footage: f64,
        location: impl Into<String>,
    ) -> Self {
        Self {
            coil_id: coil_id.into(),
            material: material.into(),
            footage,
            location: location.into(),
            status: String::new(),
        }
    }

    /// 设置状态
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// 剩余英尺数是否合法（有限且非负）
    pub fn has_valid_footage(&self) -> bool {
        self.footage.is_finite() && self.footage >= 0.0
    }
}
