// ==========================================
// 卷料库存系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型,转换下层错误为用户友好的错误消息
// 红线: 所有错误信息必须包含显式原因
// ==========================================

use crate::engine::error::{OrderError, StoreError};
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 权限错误
    // ==========================================
    /// 管理员口令缺失或不匹配
    #[error("未授权: {0}")]
    Unauthorized(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    /// 订单失败（kind 为稳定的错误类别标识）
    #[error("订单失败 [{kind}]: {message}")]
    OrderFailed { kind: String, message: String },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 导入导出错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("文件导出失败: {0}")]
    ExportError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
        }
    }
}

// ==========================================
// 从 OrderError 转换
// ==========================================
impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        let failure = err.to_failure();
        ApiError::OrderFailed {
            kind: failure.kind,
            message: failure.message,
        }
    }
}

// ==========================================
// 从 StoreError 转换（管理员覆写）
// ==========================================
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownCoil(id) => ApiError::NotFound(format!("卷料(id={})不存在", id)),
            StoreError::DuplicateCoil(id) => {
                ApiError::BusinessRuleViolation(format!("卷料已存在: {}", id))
            }
            other => ApiError::InvalidInput(other.to_string()),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        ApiError::ImportError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::AllocationError;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "Coil".to_string(),
            id: "C9".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Coil"));
                assert!(msg.contains("C9"));
            }
            _ => panic!("Expected NotFound"),
        }

        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(matches!(api_err, ApiError::DatabaseConnectionError(_)));
    }

    #[test]
    fn test_order_error_conversion_keeps_kind() {
        let order_err = OrderError::from(AllocationError::UnknownSize("9x9".to_string()));
        let api_err: ApiError = order_err.into();
        match api_err {
            ApiError::OrderFailed { kind, message } => {
                assert_eq!(kind, "UnknownSize");
                assert!(message.contains("9x9"));
            }
            _ => panic!("Expected OrderFailed"),
        }
    }

    #[test]
    fn test_store_error_conversion() {
        let api_err: ApiError = StoreError::UnknownCoil("C1".to_string()).into();
        assert!(matches!(api_err, ApiError::NotFound(_)));

        let api_err: ApiError = StoreError::InvalidAmount {
            coil_id: "C1".to_string(),
            value: -1.0,
        }
        .into();
        assert!(matches!(api_err, ApiError::InvalidInput(_)));
    }
}
