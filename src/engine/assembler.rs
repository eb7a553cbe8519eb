// ==========================================
// 卷料库存系统 - 订单装配器
// ==========================================
// 职责: 编排单个订单的完成事务
// 流程: 必填校验 → [加载库存 → 分配 → 审计记录 → 整表提交] → 追加日志 → 通知
// 红线: 方括号内对其他写者独占
// 红线: 任何阶段失败时持久库存保持不变
// 红线: 审计/通知失败降级为警告,不回滚已提交库存
// ==========================================

use crate::domain::order::Order;
use crate::domain::production_log::{AuditRecord, LogRow};
use crate::engine::allocation::{AllocationEngine, AllocationResult, LineAllocation};
use crate::engine::audit::AuditRecorder;
use crate::engine::coil_store::CoilStore;
use crate::engine::collaborators::{AuditSink, InventorySource, NotificationSink};
use crate::engine::error::OrderError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

// ==========================================
// 订单结果
// ==========================================

/// 警告类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// 审计日志写入失败（库存已提交,生产历史与库存可能不一致）
    AuditLogFailed,
    /// 通知投递失败
    NotificationFailed,
    /// 加载的库存含异常行（重复/非法英尺数）,已随本单一并修正提交
    InventoryRepaired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWarning {
    pub kind: WarningKind,
    pub message: String,
}

/// 订单完成回执（供下游格式化）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_number: String,
    pub completed_at: NaiveDateTime,
    pub total_footage: f64,
    pub lines: Vec<LineAllocation>,
    pub log_rows: Vec<LogRow>,
    pub warnings: Vec<OrderWarning>,
}

impl OrderReceipt {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

// ==========================================
// OrderAssembler - 订单装配器
// ==========================================

pub struct OrderAssembler {
    engine: AllocationEngine,
    recorder: AuditRecorder,
    inventory: Arc<dyn InventorySource>,
    audit: Arc<dyn AuditSink>,
    notifier: Arc<dyn NotificationSink>,
}

impl OrderAssembler {
    /// 创建新的装配器实例
    ///
    /// # 参数
    /// - engine: 分配引擎
    /// - inventory: 库存源（加载/整表替换）
    /// - audit: 审计日志（只追加）
    /// - notifier: 通知
    pub fn new(
        engine: AllocationEngine,
        inventory: Arc<dyn InventorySource>,
        audit: Arc<dyn AuditSink>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            engine,
            recorder: AuditRecorder::new(),
            inventory,
            audit,
            notifier,
        }
    }

    pub fn engine(&self) -> &AllocationEngine {
        &self.engine
    }

    /// 校验 + 分配 + 生成审计记录（不做 I/O）
    ///
    /// 失败时 store 与调用前一致
    pub fn prepare(
        &self,
        order: &Order,
        store: &mut CoilStore,
        timestamp: NaiveDateTime,
    ) -> Result<(AllocationResult, AuditRecord), OrderError> {
        validate_fields(order)?;

        let result = self.engine.allocate(order, store)?;
        let record = self.recorder.record(order, &result, timestamp);
        Ok((result, record))
    }

    /// 完成订单
    ///
    /// # 返回
    /// - Ok(OrderReceipt): 库存已提交；审计/通知失败体现在 warnings 中
    /// - Err(OrderError): 订单失败,持久库存未修改
    pub fn complete_order(
        &self,
        order: &Order,
        timestamp: NaiveDateTime,
    ) -> Result<OrderReceipt, OrderError> {
        info!(order_number = %order.order_number, "开始完成订单");

        // 必填字段先于任何 I/O 校验
        validate_fields(order)?;

        // 加载 → 分配 → 整表提交在库存源的独占区间内完成；
        // 分配失败时放弃写入,持久库存未变化
        let mut prepared = None;
        let mut rejected = None;
        let mut repairs = Vec::new();
        self.inventory
            .update(&mut |coils| {
                let mut store = CoilStore::new(coils);
                repairs = store.repairs().to_vec();
                match self.prepare(order, &mut store, timestamp) {
                    Ok(outcome) => {
                        prepared = Some(outcome);
                        Some(store.into_coils())
                    }
                    Err(e) => {
                        rejected = Some(e);
                        None
                    }
                }
            })
            .map_err(|e| {
                error!(order_number = %order.order_number, error = %e, "库存更新失败");
                OrderError::PersistenceFailure(format!("库存更新失败: {}", e))
            })?;

        if let Some(e) = rejected {
            return Err(e);
        }
        let (result, record) = prepared.ok_or_else(|| {
            OrderError::PersistenceFailure("库存源未执行分配".to_string())
        })?;

        let mut warnings: Vec<OrderWarning> = repairs
            .into_iter()
            .map(|message| OrderWarning {
                kind: WarningKind::InventoryRepaired,
                message,
            })
            .collect();

        if let Err(e) = self.audit.append(&record) {
            warn!(
                order_number = %order.order_number,
                error = %e,
                "审计日志写入失败,库存已提交"
            );
            warnings.push(OrderWarning {
                kind: WarningKind::AuditLogFailed,
                message: format!("审计日志写入失败（库存已提交）: {}", e),
            });
        }

        if let Err(e) = self.notifier.notify(order, &result) {
            warn!(order_number = %order.order_number, error = %e, "订单通知失败");
            warnings.push(OrderWarning {
                kind: WarningKind::NotificationFailed,
                message: format!("订单通知失败: {}", e),
            });
        }

        info!(
            order_number = %order.order_number,
            total_footage = result.total_footage,
            warnings = warnings.len(),
            "订单完成"
        );

        Ok(OrderReceipt {
            order_number: order.order_number.trim().to_string(),
            completed_at: timestamp,
            total_footage: result.total_footage,
            lines: result.lines,
            log_rows: record.rows,
            warnings,
        })
    }
}

/// 必填字段校验：客户/订单号/操作员非空,且至少一个生产行
fn validate_fields(order: &Order) -> Result<(), OrderError> {
    let mut missing: Vec<String> = order
        .missing_fields()
        .into_iter()
        .map(String::from)
        .collect();
    if order.lines.is_empty() {
        missing.push("lines".to_string());
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(OrderError::InvalidOrderFields { fields: missing })
    }
}
