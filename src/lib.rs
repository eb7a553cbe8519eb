// ==========================================
// 卷料库存系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 核心: 订单分配引擎（规格换算 → 选卷 → 扣料 → 审计）
// 红线: 订单要么整体生效,要么库存完全不变
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{AuditRecord, Coil, LogRow, Order, OrderDraft, OrderSummary, ProductionLine};

// 引擎
pub use engine::{
    AllocationEngine, AllocationError, AllocationResult, AuditRecorder, CoilStore, OrderAssembler,
    OrderError, OrderReceipt, SizeCatalog,
};

// API
pub use api::{ApiError, InventoryApi, OrderApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "卷料库存系统";
