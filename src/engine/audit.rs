// ==========================================
// 卷料库存系统 - 审计记录器
// ==========================================
// 职责: 将已完成的分配转换为审计日志（每行一条 + 订单摘要）
// 红线: 纯数据转换,不做任何 I/O
// ==========================================

use crate::domain::order::Order;
use crate::domain::production_log::{AuditRecord, LogRow, OrderSummary, BOX_USAGE_NONE};
use crate::engine::allocation::AllocationResult;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct AuditRecorder;

impl AuditRecorder {
    pub fn new() -> Self {
        Self
    }

    /// 生成审计记录
    ///
    /// # 参数
    /// - order: 已成功分配的订单
    /// - result: 该订单的分配结果（与 order.lines 一一对应）
    /// - timestamp: 订单完成时间
    pub fn record(
        &self,
        order: &Order,
        result: &AllocationResult,
        timestamp: NaiveDateTime,
    ) -> AuditRecord {
        let box_usage = box_usage_summary(&order.box_usage);

        let rows: Vec<LogRow> = result
            .lines
            .iter()
            .map(|line| LogRow {
                timestamp,
                operator: order.operator.trim().to_string(),
                client: order.client_name.trim().to_string(),
                order_number: order.order_number.trim().to_string(),
                size: line.size.clone(),
                pieces: line.pieces,
                waste: line.waste,
                coils_used: line.coil_ids().join(","),
                box_usage: box_usage.clone(),
                line_footage: line.total_footage,
            })
            .collect();

        let summary = OrderSummary {
            timestamp,
            order_number: order.order_number.trim().to_string(),
            client: order.client_name.trim().to_string(),
            operator: order.operator.trim().to_string(),
            line_count: rows.len(),
            total_pieces: result.lines.iter().map(|l| u64::from(l.pieces)).sum(),
            total_footage: result.total_footage,
            box_usage,
        };

        AuditRecord { rows, summary }
    }
}

/// 箱型用量摘要："箱型: 数量" 以 "; " 拼接,仅包含数量 > 0 的箱型
pub fn box_usage_summary(box_usage: &BTreeMap<String, u32>) -> String {
    let parts: Vec<String> = box_usage
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(box_type, count)| format!("{}: {}", box_type, count))
        .collect();

    if parts.is_empty() {
        BOX_USAGE_NONE.to_string()
    } else {
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coil::Coil;
    use crate::domain::order::{OrderDraft, ProductionLine};
    use crate::engine::allocation::AllocationEngine;
    use crate::engine::coil_store::CoilStore;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_box_usage_summary() {
        let mut usage = BTreeMap::new();
        assert_eq!(box_usage_summary(&usage), "None");

        usage.insert("Large".to_string(), 0);
        assert_eq!(box_usage_summary(&usage), "None");

        usage.insert("Small".to_string(), 4);
        usage.insert("Medium".to_string(), 2);
        assert_eq!(box_usage_summary(&usage), "Medium: 2; Small: 4");
    }

    #[test]
    fn test_one_row_per_line() {
        let mut store = CoilStore::new(vec![
            Coil::new("C1", "Steel", 100.0, "A"),
            Coil::new("C2", "Steel", 100.0, "A"),
        ]);
        let mut draft = OrderDraft::new(" ACME ", "SO-1", "kim").with_global_coils(["C1"]);
        draft.add_line(ProductionLine::new("3x3", 10, 2.0));
        draft.add_line(ProductionLine::new("2x2", 12, 0.0).with_coils(["C2", "C1"]));
        draft.set_box_count("Small", 3);
        let order = draft.into_order();

        let result = AllocationEngine::default().allocate(&order, &mut store).unwrap();
        let record = AuditRecorder::new().record(&order, &result, ts());

        assert_eq!(record.rows.len(), 2);
        let first = &record.rows[0];
        assert_eq!(first.timestamp, ts());
        assert_eq!(first.client, "ACME");
        assert_eq!(first.operator, "kim");
        assert_eq!(first.order_number, "SO-1");
        assert_eq!(first.size, "3x3");
        assert_eq!(first.pieces, 10);
        assert_eq!(first.waste, 2.0);
        assert_eq!(first.coils_used, "C1");
        assert_eq!(first.box_usage, "Small: 3");

        assert_eq!(record.rows[1].coils_used, "C2,C1");
        assert_eq!(record.rows[1].line_footage, 13.0);

        assert_eq!(record.summary.line_count, 2);
        assert_eq!(record.summary.total_pieces, 22);
        assert!((record.rows_footage() - record.summary.total_footage).abs() < 1e-9);
    }
}
