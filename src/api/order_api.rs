// ==========================================
// 卷料库存系统 - 订单 API
// ==========================================
// 职责: 订单提交/预览、生产日志查询与导出
// 红线: 订单失败时库存不变,错误类别原样返回调用方
// ==========================================

use std::path::Path;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::order::{Order, OrderDraft};
use crate::domain::production_log::{LogRow, OrderSummary};
use crate::engine::allocation::{AllocationEngine, AllocationResult};
use crate::engine::assembler::{OrderAssembler, OrderReceipt};
use crate::engine::coil_store::CoilStore;
use crate::engine::collaborators::NotificationSink;
use crate::repository::coil_repo::CoilRepository;
use crate::repository::production_log_repo::ProductionLogRepository;

/// 导出 CSV 的表头（与日志行字段顺序一致）
const LOG_CSV_HEADERS: [&str; 10] = [
    "Timestamp",
    "Operator",
    "Client",
    "OrderNumber",
    "Size",
    "Pieces",
    "Waste",
    "CoilsUsed",
    "BoxUsage",
    "LineFootage",
];

const CSV_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// OrderApi - 订单 API
// ==========================================
pub struct OrderApi {
    assembler: OrderAssembler,
    coil_repo: Arc<CoilRepository>,
    log_repo: Arc<ProductionLogRepository>,
    config: Arc<ConfigManager>,
}

impl OrderApi {
    /// 创建新的 OrderApi 实例
    ///
    /// # 参数
    /// - coil_repo: 卷料库存仓储（订单库存源）
    /// - log_repo: 生产日志仓储（审计日志）
    /// - config: 配置管理器（订单默认值）
    /// - notifier: 订单通知
    pub fn new(
        coil_repo: Arc<CoilRepository>,
        log_repo: Arc<ProductionLogRepository>,
        config: Arc<ConfigManager>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let assembler = OrderAssembler::new(
            AllocationEngine::default(),
            coil_repo.clone(),
            log_repo.clone(),
            notifier,
        );
        Self {
            assembler,
            coil_repo,
            log_repo,
            config,
        }
    }

    // ==========================================
    // 订单
    // ==========================================

    /// 新建订单草稿（额外英寸取配置默认值）
    pub fn new_draft(
        &self,
        client_name: &str,
        order_number: &str,
        operator: &str,
    ) -> ApiResult<OrderDraft> {
        let allowance = self.config.default_extra_inch_allowance()?;
        Ok(OrderDraft::new(client_name, order_number, operator).with_extra_inch_allowance(allowance))
    }

    /// 预览订单分配（不写库）
    pub fn preview_order(&self, order: &Order) -> ApiResult<AllocationResult> {
        let mut store = CoilStore::new(self.coil_repo.list_all()?);
        let (result, _) = self.assembler.prepare(order, &mut store, now())?;
        Ok(result)
    }

    /// 提交订单（当前本地时间作为完成时间）
    pub fn submit_order(&self, order: &Order) -> ApiResult<OrderReceipt> {
        self.submit_order_at(order, now())
    }

    /// 以指定完成时间提交订单
    #[instrument(skip(self, order), fields(order_number = %order.order_number))]
    pub fn submit_order_at(
        &self,
        order: &Order,
        completed_at: NaiveDateTime,
    ) -> ApiResult<OrderReceipt> {
        let receipt = self.assembler.complete_order(order, completed_at)?;
        Ok(receipt)
    }

    // ==========================================
    // 生产日志
    // ==========================================

    /// 最近的日志行（最新在前）
    pub fn list_recent_logs(&self, limit: usize) -> ApiResult<Vec<LogRow>> {
        if limit == 0 {
            return Err(ApiError::InvalidInput("limit 必须大于 0".to_string()));
        }
        Ok(self.log_repo.list_recent(limit)?)
    }

    /// 按订单号查询日志行
    pub fn find_logs_by_order(&self, order_number: &str) -> ApiResult<Vec<LogRow>> {
        let order_number = order_number.trim();
        if order_number.is_empty() {
            return Err(ApiError::InvalidInput("订单号不能为空".to_string()));
        }
        Ok(self.log_repo.find_by_order_number(order_number)?)
    }

    /// 查询订单摘要（同一订单号多次完成时取最后一次）
    pub fn find_order_summary(&self, order_number: &str) -> ApiResult<Option<OrderSummary>> {
        let order_number = order_number.trim();
        if order_number.is_empty() {
            return Err(ApiError::InvalidInput("订单号不能为空".to_string()));
        }
        Ok(self
            .log_repo
            .find_summaries_by_order(order_number)?
            .into_iter()
            .last())
    }

    /// 导出全部日志行为 CSV
    ///
    /// # 返回
    /// - Ok(usize): 导出的行数（不含表头）
    pub fn export_logs_csv(&self, file_path: &Path) -> ApiResult<usize> {
        let rows = self.log_repo.list_all()?;

        let mut writer = csv::Writer::from_path(file_path)
            .map_err(|e| ApiError::ExportError(format!("{}: {}", file_path.display(), e)))?;
        writer
            .write_record(LOG_CSV_HEADERS)
            .map_err(|e| ApiError::ExportError(e.to_string()))?;

        for row in &rows {
            writer
                .write_record([
                    row.timestamp.format(CSV_TS_FORMAT).to_string(),
                    row.operator.clone(),
                    row.client.clone(),
                    row.order_number.clone(),
                    row.size.clone(),
                    row.pieces.to_string(),
                    row.waste.to_string(),
                    row.coils_used.clone(),
                    row.box_usage.clone(),
                    format!("{:.3}", row.line_footage),
                ])
                .map_err(|e| ApiError::ExportError(e.to_string()))?;
        }
        writer
            .flush()
            .map_err(|e| ApiError::ExportError(e.to_string()))?;

        info!(file = %file_path.display(), rows = rows.len(), "生产日志导出完成");
        Ok(rows.len())
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
