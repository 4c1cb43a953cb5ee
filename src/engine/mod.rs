// ==========================================
// 生产工单流转系统 - 引擎层
// ==========================================
// 职责: 流转策略与授权决策
// 红线: 引擎不访问数据库,不修改实体
// ==========================================

pub mod transition_table;
pub mod workflow;

// 重导出核心引擎
pub use transition_table::{rules_from, transition_table, TransitionRule};
pub use workflow::{SideEffect, TransitionDecision, TransitionError, WorkflowEngine};
