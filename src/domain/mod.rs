// ==========================================
// 生产工单流转系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod order;
pub mod timeline;
pub mod types;

// 重导出核心类型
pub use order::{ProductionOrder, QualityCheckResult};
pub use timeline::{replay_status, TimelineEntry, SYSTEM_ACTOR};
pub use types::{CommandKind, OrderStatus};
