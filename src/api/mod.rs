// ==========================================
// 生产工单流转系统 - API 层
// ==========================================
// 职责: 编排用例 (WorkflowApi) 与只读聚合 (DashboardApi),
//       统一错误类型与响应信封
// ==========================================

pub mod dashboard_api;
pub mod envelope;
pub mod error;
pub mod workflow_api;

// 重导出核心类型
pub use dashboard_api::{DashboardApi, OverdueProduction, StatusCount, WipDashboard};
pub use envelope::{error_code, ErrorBody, ResponseEnvelope};
pub use error::{ApiError, ApiResult};
pub use workflow_api::{CreateOrderRequest, EmployeeWorkload, WorkflowApi, WorkflowView};
