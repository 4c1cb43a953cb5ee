// ==========================================
// 生产工单流转系统 - 统一响应信封
// ==========================================
// 职责: 将 ApiResult 映射为 {success, data | error} 的统一响应,
//       错误携带稳定的错误代码,由传输层映射为状态码
// ==========================================

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};

/// 错误体 (返回给调用方)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// 稳定错误代码
    pub code: String,
    /// 人类可读的错误消息
    pub message: String,
}

/// 统一响应信封
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    /// 指令是否成功
    pub success: bool,
    /// 成功时的数据载荷
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// 失败时的错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> ResponseEnvelope<T> {
    /// 成功响应
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// 失败响应
    pub fn fail(err: ApiError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: error_code(&err).to_string(),
                message: err.to_string(),
            }),
        }
    }

    /// 从 ApiResult 构造信封
    pub fn from_result(result: ApiResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::fail(err),
        }
    }
}

/// ApiError -> 稳定错误代码
pub fn error_code(err: &ApiError) -> &'static str {
    match err {
        ApiError::OrderNotFound(_) => "ORDER_NOT_FOUND",
        ApiError::InvalidTransition { .. } => "INVALID_TRANSITION",
        ApiError::NoOpTransition(_) => "NOOP_TRANSITION",
        ApiError::OrderClosed(_) => "ORDER_CLOSED",
        ApiError::ValidationError(_) => "VALIDATION_ERROR",
        ApiError::InvalidInput(_) => "INVALID_INPUT",
        ApiError::ConcurrencyConflict(_) => "CONCURRENCY_CONFLICT",
        ApiError::PersistenceError(_) => "PERSISTENCE_ERROR",
        ApiError::InternalError(_) => "INTERNAL_ERROR",
        ApiError::Other(_) => "OTHER_ERROR",
    }
}
