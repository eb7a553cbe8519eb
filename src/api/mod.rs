// ==========================================
// 卷料库存系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行调用
// ==========================================

pub mod error;
pub mod inventory_api;
pub mod order_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use inventory_api::{ImportSummary, InventoryApi};
pub use order_api::OrderApi;
