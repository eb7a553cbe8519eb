// ==========================================
// 卷料库存系统 - 引擎层
// ==========================================
// 职责: 订单分配业务规则,不拼 SQL
// 红线: 引擎同步执行,单个订单内按提交顺序处理,无内部并行
// 红线: 所有错误必须输出原因
// ==========================================

pub mod allocation;
pub mod assembler;
pub mod audit;
pub mod coil_store;
pub mod collaborators;
pub mod error;
pub mod size_catalog;

// 重导出核心引擎
pub use allocation::{
    AllocationEngine, AllocationPolicy, AllocationResult, CoilDebit, EvenSplit, LineAllocation,
};
pub use assembler::{OrderAssembler, OrderReceipt, OrderWarning, WarningKind};
pub use audit::{box_usage_summary, AuditRecorder};
pub use coil_store::{CoilSnapshot, CoilStore};
pub use collaborators::{
    AuditSink, CollaboratorError, InventorySource, LoggingNotificationSink, NoOpNotificationSink,
    NotificationSink,
};
pub use error::{AllocationError, OrderError, OrderFailure, StoreError};
pub use size_catalog::{SizeCatalog, STANDARD_SIZES};
