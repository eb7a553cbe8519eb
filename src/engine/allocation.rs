// ==========================================
// 卷料库存系统 - 订单分配引擎
// ==========================================
// 职责: 生产行 → 英尺需求 → 卷料扣料
// 红线: 整单原子性（快照 → 全部行投机扣料 → 任一失败整体回滚）
// 红线: 不得逐行"先校验后修改"而无回滚路径
// ==========================================
// 换算: 单件英寸 = 规格宽度 + 额外英寸
//       行英尺 = 件数 × 单件英寸 / 12 + 损耗英尺
// ==========================================

use crate::domain::order::{Order, ProductionLine};
use crate::engine::coil_store::CoilStore;
use crate::engine::error::AllocationError;
use crate::engine::size_catalog::SizeCatalog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

const INCHES_PER_FOOT: f64 = 12.0;

// ==========================================
// 分配策略
// ==========================================

/// 行英尺在所选卷料之间的分摊策略
pub trait AllocationPolicy: Send + Sync {
    /// 策略名称（用于日志）
    fn name(&self) -> &'static str;

    /// 将 `line_footage` 分摊到 `coil_ids`（非空、已去重、保持顺序）
    fn split(&self, line_footage: f64, coil_ids: &[String]) -> Vec<CoilDebit>;
}

/// 平均分摊：每卷 `line_footage / k`,不做余数修正
#[derive(Debug, Clone, Copy, Default)]
pub struct EvenSplit;

impl AllocationPolicy for EvenSplit {
    fn name(&self) -> &'static str {
        "EvenSplit"
    }

    fn split(&self, line_footage: f64, coil_ids: &[String]) -> Vec<CoilDebit> {
        let per_coil = line_footage / coil_ids.len() as f64;
        coil_ids
            .iter()
            .map(|id| CoilDebit {
                coil_id: id.clone(),
                footage: per_coil,
            })
            .collect()
    }
}

// ==========================================
// 分配结果
// ==========================================

/// 单卷扣料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoilDebit {
    pub coil_id: String,
    pub footage: f64,
}

/// 单行分配结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineAllocation {
    pub line_index: usize,
    pub size: String,
    pub pieces: u32,
    pub waste: f64,
    pub inches_per_piece: f64,
    pub debits: Vec<CoilDebit>, // 按解析顺序
    pub total_footage: f64,
}

impl LineAllocation {
    /// 本行使用的卷料号（按解析顺序）
    pub fn coil_ids(&self) -> Vec<&str> {
        self.debits.iter().map(|d| d.coil_id.as_str()).collect()
    }
}

/// 整单分配结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub lines: Vec<LineAllocation>,
    pub total_footage: f64,
}

impl AllocationResult {
    /// 按卷料汇总扣料量
    pub fn debits_by_coil(&self) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for debit in self.lines.iter().flat_map(|l| l.debits.iter()) {
            *totals.entry(debit.coil_id.clone()).or_insert(0.0) += debit.footage;
        }
        totals
    }
}

// ==========================================
// AllocationEngine - 分配引擎
// ==========================================
// 无状态: 两次调用之间不保留任何订单数据
pub struct AllocationEngine {
    catalog: SizeCatalog,
    policy: Box<dyn AllocationPolicy>,
}

impl Default for AllocationEngine {
    fn default() -> Self {
        Self::new(SizeCatalog::standard())
    }
}

impl AllocationEngine {
    /// 使用默认平均分摊策略
    pub fn new(catalog: SizeCatalog) -> Self {
        Self::with_policy(catalog, Box::new(EvenSplit))
    }

    pub fn with_policy(catalog: SizeCatalog, policy: Box<dyn AllocationPolicy>) -> Self {
        Self { catalog, policy }
    }

    pub fn catalog(&self) -> &SizeCatalog {
        &self.catalog
    }

    /// 计算单行所需英尺数
    pub fn line_footage(
        &self,
        line: &ProductionLine,
        extra_inch_allowance: f64,
    ) -> Result<(f64, f64), AllocationError> {
        let inches_per_piece = self.catalog.width_inches(&line.size)? + extra_inch_allowance;
        let footage = f64::from(line.pieces) * inches_per_piece / INCHES_PER_FOOT + line.waste;
        Ok((inches_per_piece, footage))
    }

    /// 执行整单分配
    ///
    /// # 参数
    /// - order: 生产订单
    /// - store: 卷料存储（成功时被扣料；失败时恢复到调用前状态）
    ///
    /// # 返回
    /// - Ok(AllocationResult): 所有行均通过校验并已扣料
    /// - Err(AllocationError): 首个失败原因,store 与调用前完全一致
    pub fn allocate(
        &self,
        order: &Order,
        store: &mut CoilStore,
    ) -> Result<AllocationResult, AllocationError> {
        info!(
            order_number = %order.order_number,
            lines = order.lines.len(),
            policy = self.policy.name(),
            "开始订单分配"
        );

        let snapshot = store.snapshot();
        match self.allocate_lines(order, store) {
            Ok(result) => {
                info!(
                    order_number = %order.order_number,
                    total_footage = result.total_footage,
                    "订单分配完成"
                );
                Ok(result)
            }
            Err(err) => {
                store.restore(snapshot);
                warn!(order_number = %order.order_number, error = %err, "订单分配失败,已回滚");
                Err(err)
            }
        }
    }

    fn allocate_lines(
        &self,
        order: &Order,
        store: &mut CoilStore,
    ) -> Result<AllocationResult, AllocationError> {
        if order.lines.is_empty() {
            return Err(AllocationError::InvalidQuantity("订单没有生产行".to_string()));
        }
        let allowance = order.extra_inch_allowance;
        if !allowance.is_finite() || allowance < 0.0 {
            return Err(AllocationError::InvalidQuantity(format!(
                "额外英寸不能为负: {}",
                allowance
            )));
        }

        let mut lines = Vec::with_capacity(order.lines.len());
        let mut total_footage = 0.0;

        for (line_index, line) in order.lines.iter().enumerate() {
            // 步骤1: 解析卷料集合
            let coil_ids = resolve_coils(line, &order.global_coil_selection)
                .ok_or(AllocationError::NoCoilsSelected { line_index })?;

            validate_line(line_index, line)?;

            // 步骤2-3: 英尺需求
            let (inches_per_piece, line_footage) = self.line_footage(line, allowance)?;

            // 步骤4: 分摊
            let debits = self.policy.split(line_footage, &coil_ids);

            // 步骤5: 逐卷校验并投机扣料（失败由上层整体回滚）
            for debit in &debits {
                let remaining = store.debit(&debit.coil_id, debit.footage)?;
                debug!(
                    line_index,
                    coil_id = %debit.coil_id,
                    debit = debit.footage,
                    remaining,
                    "卷料扣料"
                );
            }

            total_footage += line_footage;
            lines.push(LineAllocation {
                line_index,
                size: line.size.trim().to_string(),
                pieces: line.pieces,
                waste: line.waste,
                inches_per_piece,
                debits,
                total_footage: line_footage,
            });
        }

        Ok(AllocationResult {
            lines,
            total_footage,
        })
    }
}

/// 解析行卷料集合：行内选择优先,否则使用全局选择；去重并保持首次出现顺序
fn resolve_coils(line: &ProductionLine, global: &[String]) -> Option<Vec<String>> {
    let source = if line.coil_selection.is_empty() {
        global
    } else {
        &line.coil_selection
    };

    let mut resolved: Vec<String> = Vec::with_capacity(source.len());
    for id in source {
        let id = id.trim();
        if !id.is_empty() && !resolved.iter().any(|r| r == id) {
            resolved.push(id.to_string());
        }
    }

    if resolved.is_empty() {
        None
    } else {
        Some(resolved)
    }
}

fn validate_line(line_index: usize, line: &ProductionLine) -> Result<(), AllocationError> {
    if line.pieces == 0 {
        return Err(AllocationError::InvalidQuantity(format!(
            "line={} 件数必须为正",
            line_index
        )));
    }
    if !line.waste.is_finite() || line.waste < 0.0 {
        return Err(AllocationError::InvalidQuantity(format!(
            "line={} 损耗不能为负: {}",
            line_index, line.waste
        )));
    }
    Ok(())
}
