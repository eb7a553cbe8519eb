// ==========================================
// 卷料库存系统 - 生产日志领域模型
// ==========================================
// 职责: 定义订单完成后写入审计日志的数据结构
// 红线: 每个生产行恰好一条日志
// 对齐: production_log / order_summary 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 箱型用量全部为 0 时的摘要标记
pub const BOX_USAGE_NONE: &str = "None";

// ==========================================
// LogRow - 生产行日志
// ==========================================
// 用途: 追加写入外部审计日志（只追加）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    pub timestamp: NaiveDateTime, // 订单完成时间
    pub operator: String,         // 操作员
    pub client: String,           // 客户
    pub order_number: String,     // 订单号
    pub size: String,             // 规格标签
    pub pieces: u32,              // 件数
    pub waste: f64,               // 损耗英尺数
    pub coils_used: String,       // 使用卷料（逗号拼接,按解析顺序）
    pub box_usage: String,        // 箱型用量摘要
    pub line_footage: f64,        // 本行总英尺数
}

// ==========================================
// OrderSummary - 订单摘要
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub timestamp: NaiveDateTime,
    pub order_number: String,
    pub client: String,
    pub operator: String,
    pub line_count: usize,
    pub total_pieces: u64,
    pub total_footage: f64,
    pub box_usage: String,
}

// ==========================================
// AuditRecord - 单个订单的审计记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub rows: Vec<LogRow>,
    pub summary: OrderSummary,
}

impl AuditRecord {
    /// 日志行的英尺数合计
    pub fn rows_footage(&self) -> f64 {
        self.rows.iter().map(|r| r.line_footage).sum()
    }
}
