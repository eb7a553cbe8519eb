// ==========================================
// 卷料库存系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 错误信息必须包含显式原因（卷料号/规格/字段）
// ==========================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// StoreError - 卷料存储错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("卷料不存在: {0}")]
    UnknownCoil(String),

    #[error("卷料英尺数不足: coil={coil_id}, requested={requested:.3}, available={available:.3}")]
    InsufficientFootage {
        coil_id: String,
        requested: f64,
        available: f64,
    },

    #[error("无效的英尺数: coil={coil_id}, value={value}")]
    InvalidAmount { coil_id: String, value: f64 },

    #[error("卷料已存在: {0}")]
    DuplicateCoil(String),
}

// ==========================================
// AllocationError - 分配引擎错误
// ==========================================
// 红线: 任何分配错误都使整单失败,且不留下部分扣料
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocationError {
    #[error("未知规格: {0}")]
    UnknownSize(String),

    #[error("卷料不存在: {0}")]
    UnknownCoil(String),

    #[error("生产行未选择卷料且订单无全局卷料选择: line={line_index}")]
    NoCoilsSelected { line_index: usize },

    #[error("卷料英尺数不足: coil={coil_id}, requested={requested:.3}, available={available:.3}")]
    InsufficientFootage {
        coil_id: String,
        requested: f64,
        available: f64,
    },

    #[error("数量参数无效: {0}")]
    InvalidQuantity(String),
}

impl From<StoreError> for AllocationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownCoil(id) => AllocationError::UnknownCoil(id),
            StoreError::InsufficientFootage {
                coil_id,
                requested,
                available,
            } => AllocationError::InsufficientFootage {
                coil_id,
                requested,
                available,
            },
            StoreError::InvalidAmount { coil_id, value } => AllocationError::InvalidQuantity(
                format!("coil={} 扣料量={}", coil_id, value),
            ),
            StoreError::DuplicateCoil(id) => {
                AllocationError::InvalidQuantity(format!("重复卷料: {}", id))
            }
        }
    }
}

// ==========================================
// OrderError - 订单装配错误
// ==========================================
#[derive(Error, Debug)]
pub enum OrderError {
    #[error("订单必填字段缺失: {}", fields.join(", "))]
    InvalidOrderFields { fields: Vec<String> },

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error("持久化失败: {0}")]
    PersistenceFailure(String),
}

impl OrderError {
    /// 稳定的错误类别标识（供上层格式化/统计使用）
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::InvalidOrderFields { .. } => "InvalidOrderFields",
            OrderError::PersistenceFailure(_) => "PersistenceFailure",
            OrderError::Allocation(err) => match err {
                AllocationError::UnknownSize(_) => "UnknownSize",
                AllocationError::UnknownCoil(_) => "UnknownCoil",
                AllocationError::NoCoilsSelected { .. } => "NoCoilsSelected",
                AllocationError::InsufficientFootage { .. } => "InsufficientFootage",
                AllocationError::InvalidQuantity(_) => "InvalidQuantity",
            },
        }
    }

    /// 转换为可序列化的失败结构
    pub fn to_failure(&self) -> OrderFailure {
        OrderFailure {
            kind: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

/// 订单失败（错误类别 + 消息）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFailure {
    pub kind: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_for_allocation_errors() {
        let err = OrderError::from(AllocationError::InsufficientFootage {
            coil_id: "C2".to_string(),
            requested: 8.7,
            available: 5.0,
        });
        assert_eq!(err.kind(), "InsufficientFootage");

        let failure = err.to_failure();
        assert_eq!(failure.kind, "InsufficientFootage");
        assert!(failure.message.contains("C2"));
    }

    #[test]
    fn test_invalid_fields_message_lists_fields() {
        let err = OrderError::InvalidOrderFields {
            fields: vec!["client_name".to_string(), "operator".to_string()],
        };
        assert_eq!(err.kind(), "InvalidOrderFields");
        assert!(err.to_string().contains("client_name, operator"));
    }

    #[test]
    fn test_store_error_maps_to_allocation_error() {
        let err: AllocationError = StoreError::UnknownCoil("X".to_string()).into();
        assert_eq!(err, AllocationError::UnknownCoil("X".to_string()));
    }
}
