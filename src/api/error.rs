// ==========================================
// 生产工单流转系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型,转换 Repository/引擎错误为稳定的业务错误
// 约束: 所有错误信息必须包含显式原因,不暴露堆栈与内部标识
// ==========================================

use thiserror::Error;

use crate::domain::types::OrderStatus;
use crate::engine::workflow::TransitionError;
use crate::repository::error::RepositoryError;

/// API层错误类型
///
/// 所有错误在编排层边界可恢复: 只产生失败响应,不触发未处理故障,
/// 核心内部不做任何自动重试 (重试属调用方策略)
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 流转错误
    // ==========================================
    #[error("工单不存在: {0}")]
    OrderNotFound(String),

    #[error("无效的状态流转: from={from} to={to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("重复流转: {0}")]
    NoOpTransition(String),

    #[error("工单已关闭: {0}")]
    OrderClosed(String),

    // ==========================================
    // 输入校验错误
    // ==========================================
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("并发冲突: {0}")]
    ConcurrencyConflict(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("持久化失败: {0}")]
    PersistenceError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为稳定的业务错误种类
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::OptimisticLockFailure {
                order_id,
                expected,
                actual,
            } => ApiError::ConcurrencyConflict(format!(
                "工单{}已被其他指令修改（期望revision={}，实际revision={}），请重新读取后重试",
                order_id, expected, actual
            )),
            RepositoryError::NotFound { entity, id } => {
                ApiError::OrderNotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::PersistenceError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::UniqueConstraintViolation(msg)
            | RepositoryError::ForeignKeyViolation(msg) => ApiError::PersistenceError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从引擎 TransitionError 转换
// ==========================================
impl From<TransitionError> for ApiError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::InvalidTransition { from, to } => {
                ApiError::InvalidTransition { from, to }
            }
            TransitionError::NoOpTransition { state } => {
                ApiError::NoOpTransition(format!("工单已处于状态{}", state))
            }
            TransitionError::OrderClosed { state } => {
                ApiError::OrderClosed(format!("工单已处于终态{}", state))
            }
            TransitionError::MissingReason { to } => {
                ApiError::ValidationError(format!("流转到{}必须提供原因", to))
            }
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimistic_lock_maps_to_concurrency_conflict() {
        let repo_err = RepositoryError::OptimisticLockFailure {
            order_id: "O-1".to_string(),
            expected: 1,
            actual: 2,
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::ConcurrencyConflict(msg) => {
                assert!(msg.contains("O-1"));
                assert!(msg.contains("已被其他指令修改"));
            }
            _ => panic!("Expected ConcurrencyConflict"),
        }
    }

    #[test]
    fn test_not_found_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "ProductionOrder".to_string(),
            id: "O-404".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::OrderNotFound(msg) => {
                assert!(msg.contains("O-404"));
            }
            _ => panic!("Expected OrderNotFound"),
        }
    }

    #[test]
    fn test_transition_error_conversion() {
        let err: ApiError = TransitionError::MissingReason {
            to: OrderStatus::OnHold,
        }
        .into();
        assert!(matches!(err, ApiError::ValidationError(_)));

        let err: ApiError = TransitionError::NoOpTransition {
            state: OrderStatus::InProgress,
        }
        .into();
        assert!(matches!(err, ApiError::NoOpTransition(_)));
    }
}
