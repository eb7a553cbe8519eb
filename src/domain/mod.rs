// ==========================================
// 卷料库存系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值对象
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod coil;
pub mod order;
pub mod production_log;

// 重导出核心类型
pub use coil::Coil;
pub use order::{Order, OrderDraft, ProductionLine};
pub use production_log::{AuditRecord, LogRow, OrderSummary, BOX_USAGE_NONE};
