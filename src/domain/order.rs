// ==========================================
// 卷料库存系统 - 生产订单领域模型
// ==========================================
// 职责: 定义生产订单、生产行、订单草稿
// 说明: 订单草稿由调用方会话持有,提交前可反复修改,无全局单例
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ProductionLine - 生产行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionLine {
    pub size: String, // 规格标签（必须存在于规格目录）
    pub pieces: u32,  // 件数（正整数）
    pub waste: f64,   // 损耗英尺数（>= 0,直接累加,不参与单件换算）

    /// 本行指定卷料（有序集合）；为空表示使用订单全局选择
    #[serde(default)]
    pub coil_selection: Vec<String>,
}

impl ProductionLine {
    /// 创建新的生产行（使用订单全局卷料选择）
    pub fn new(size: impl Into<String>, pieces: u32, waste: f64) -> Self {
        Self {
            size: size.into(),
            pieces,
            waste,
            coil_selection: Vec::new(),
        }
    }

    /// 指定本行使用的卷料
    pub fn with_coils<I, S>(mut self, coil_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.coil_selection = coil_ids.into_iter().map(Into::into).collect();
        self
    }
}

// ==========================================
// Order - 生产订单
// ==========================================
// 红线: 客户/订单号/操作员必填
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    // ===== 订单抬头 =====
    pub client_name: String,  // 客户名称
    pub order_number: String, // 订单号
    pub operator: String,     // 操作员

    // ===== 计算参数 =====
    /// 每件额外英寸（修边余量,换算英尺前累加到单件宽度上）
    #[serde(default)]
    pub extra_inch_allowance: f64,

    // ===== 包装用量 =====
    /// 箱型 → 数量
    #[serde(default)]
    pub box_usage: BTreeMap<String, u32>,

    // ===== 生产行 =====
    pub lines: Vec<ProductionLine>,

    /// 全局卷料选择（生产行未指定卷料时使用）
    #[serde(default)]
    pub global_coil_selection: Vec<String>,
}

impl Order {
    /// 返回缺失的必填字段名（空白视为缺失）
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.client_name.trim().is_empty() {
            missing.push("client_name");
        }
        if self.order_number.trim().is_empty() {
            missing.push("order_number");
        }
        if self.operator.trim().is_empty() {
            missing.push("operator");
        }
        missing
    }

    /// 订单总件数
    pub fn total_pieces(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.pieces)).sum()
    }
}

// ==========================================
// OrderDraft - 订单草稿
// ==========================================

/// 编辑中的订单
///
/// 由调用方持有并逐步填充,`into_order` 后交给订单装配器。
/// 草稿本身不做校验,校验统一在装配器和分配引擎中完成。
#[derive(Debug, Clone, Default)]
pub struct OrderDraft {
    client_name: String,
    order_number: String,
    operator: String,
    extra_inch_allowance: f64,
    box_usage: BTreeMap<String, u32>,
    lines: Vec<ProductionLine>,
    global_coil_selection: Vec<String>,
}

impl OrderDraft {
    pub fn new(
        client_name: impl Into<String>,
        order_number: impl Into<String>,
        operator: impl Into<String>,
    ) -> Self {
        Self {
            client_name: client_name.into(),
            order_number: order_number.into(),
            operator: operator.into(),
            ..Default::default()
        }
    }

    pub fn with_extra_inch_allowance(mut self, inches: f64) -> Self {
        self.extra_inch_allowance = inches;
        self
    }

    pub fn with_global_coils<I, S>(mut self, coil_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.global_coil_selection = coil_ids.into_iter().map(Into::into).collect();
        self
    }

    /// 追加生产行,返回其下标
    pub fn add_line(&mut self, line: ProductionLine) -> usize {
        self.lines.push(line);
        self.lines.len() - 1
    }

    /// 删除生产行；下标越界返回 None
    pub fn remove_line(&mut self, index: usize) -> Option<ProductionLine> {
        if index < self.lines.len() {
            Some(self.lines.remove(index))
        } else {
            None
        }
    }

    /// 设置箱型用量（0 表示清除该箱型）
    pub fn set_box_count(&mut self, box_type: impl Into<String>, count: u32) {
        let box_type = box_type.into();
        if count == 0 {
            self.box_usage.remove(&box_type);
        } else {
            self.box_usage.insert(box_type, count);
        }
    }

    pub fn lines(&self) -> &[ProductionLine] {
        &self.lines
    }

    pub fn into_order(self) -> Order {
        Order {
            client_name: self.client_name,
            order_number: self.order_number,
            operator: self.operator,
            extra_inch_allowance: self.extra_inch_allowance,
            box_usage: self.box_usage,
            lines: self.lines,
            global_coil_selection: self.global_coil_selection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_treats_blank_as_missing() {
        let order = OrderDraft::new("  ", "SO-1", "").into_order();
        assert_eq!(order.missing_fields(), vec!["client_name", "operator"]);
    }

    #[test]
    fn test_draft_add_and_remove_lines() {
        let mut draft = OrderDraft::new("ACME", "SO-1", "kim").with_global_coils(["C1"]);
        draft.add_line(ProductionLine::new("3x3", 10, 0.0));
        let idx = draft.add_line(ProductionLine::new("4x4", 5, 1.5).with_coils(["C2"]));
        assert_eq!(idx, 1);

        let removed = draft.remove_line(0).unwrap();
        assert_eq!(removed.size, "3x3");
        assert!(draft.remove_line(5).is_none());

        let order = draft.into_order();
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].coil_selection, vec!["C2".to_string()]);
        assert_eq!(order.global_coil_selection, vec!["C1".to_string()]);
    }

    #[test]
    fn test_set_box_count_zero_clears_entry() {
        let mut draft = OrderDraft::new("ACME", "SO-1", "kim");
        draft.set_box_count("Small", 3);
        draft.set_box_count("Large", 1);
        draft.set_box_count("Large", 0);

        let order = draft.into_order();
        assert_eq!(order.box_usage.len(), 1);
        assert_eq!(order.box_usage.get("Small"), Some(&3));
    }

    #[test]
    fn test_order_deserializes_with_defaults() {
        let json = r#"{
            "client_name": "ACME",
            "order_number": "SO-9",
            "operator": "kim",
            "lines": [{"size": "3x3", "pieces": 4, "waste": 0.5}]
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.extra_inch_allowance, 0.0);
        assert!(order.box_usage.is_empty());
        assert!(order.lines[0].coil_selection.is_empty());
        assert_eq!(order.total_pieces(), 4);
    }
}
