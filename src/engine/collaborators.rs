// ==========================================
// 卷料库存系统 - 引擎外部协作者接口
// ==========================================
// 职责: 定义库存源、审计日志、通知的 trait,实现依赖倒置
// 说明: Engine 层定义 trait,Repository 层实现（SQLite）
// ==========================================

use crate::domain::coil::Coil;
use crate::domain::order::Order;
use crate::domain::production_log::AuditRecord;
use crate::engine::allocation::AllocationResult;
use std::error::Error;

/// 协作者错误类型
pub type CollaboratorError = Box<dyn Error + Send + Sync>;

// ==========================================
// 库存源
// ==========================================

/// 库存源 Trait
///
/// 以读-改-写方式提供完整卷料表：加载、交给调用方变更、整表替换。
///
/// # 并发说明
/// 实现方须保证 update 的整个区间对其他写者独占,
/// 否则并发订单的扣料结果会相互覆盖。
pub trait InventorySource: Send + Sync {
    /// 加载整表并交给 apply；apply 返回 Some 时整表替换,返回 None 时不写入
    ///
    /// # 返回
    /// - Ok(true): 已提交
    /// - Ok(false): apply 放弃写入
    fn update(
        &self,
        apply: &mut dyn FnMut(Vec<Coil>) -> Option<Vec<Coil>>,
    ) -> Result<bool, CollaboratorError>;
}

// ==========================================
// 审计日志
// ==========================================

/// 审计日志 Trait（只追加）
///
/// 失败不会回滚已提交的库存变更,由调用方以警告形式上报
pub trait AuditSink: Send + Sync {
    /// 追加一个订单的审计记录,返回写入的日志行数
    fn append(&self, record: &AuditRecord) -> Result<usize, CollaboratorError>;
}

// ==========================================
// 通知
// ==========================================

/// 通知 Trait（单据投递等）
///
/// 仅消费订单与分配结果做格式化；失败不影响库存与审计
pub trait NotificationSink: Send + Sync {
    fn notify(&self, order: &Order, result: &AllocationResult) -> Result<(), CollaboratorError>;
}

/// 空操作通知
#[derive(Debug, Clone, Default)]
pub struct NoOpNotificationSink;

impl NotificationSink for NoOpNotificationSink {
    fn notify(&self, order: &Order, _result: &AllocationResult) -> Result<(), CollaboratorError> {
        tracing::debug!(
            "NoOpNotificationSink: 跳过通知 - order_number={}",
            order.order_number
        );
        Ok(())
    }
}

/// 日志通知：以结构化日志输出订单完成信息
#[derive(Debug, Clone, Default)]
pub struct LoggingNotificationSink;

impl NotificationSink for LoggingNotificationSink {
    fn notify(&self, order: &Order, result: &AllocationResult) -> Result<(), CollaboratorError> {
        tracing::info!(
            order_number = %order.order_number,
            client = %order.client_name,
            lines = result.lines.len(),
            total_footage = %format!("{:.2}", result.total_footage),
            "订单完成通知"
        );
        Ok(())
    }
}
