// ==========================================
// 生产工单流转系统 - 领域类型定义
// ==========================================
// 职责: 工单状态、指令类型等核心枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 工单状态 (Order Status)
// ==========================================
// 红线: 状态只能通过流转引擎变更,禁止直接赋值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,             // 待开工
    InProgress,          // 生产中
    OnHold,              // 挂起
    QualityCheckPending, // 待质检
    Completed,           // 已完成
    Cancelled,           // 已取消
    Rework,              // 返工
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl OrderStatus {
    /// 所有状态 (固定顺序,用于驾驶舱分状态统计)
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::OnHold,
        OrderStatus::QualityCheckPending,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::Rework,
    ];

    /// 是否为终态 (终态工单不再接受任何指令)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::OnHold => "ON_HOLD",
            OrderStatus::QualityCheckPending => "QUALITY_CHECK_PENDING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Rework => "REWORK",
        }
    }

    /// 从字符串解析状态
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(OrderStatus::Pending),
            "IN_PROGRESS" => Some(OrderStatus::InProgress),
            "ON_HOLD" => Some(OrderStatus::OnHold),
            "QUALITY_CHECK_PENDING" => Some(OrderStatus::QualityCheckPending),
            "COMPLETED" => Some(OrderStatus::Completed),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            "REWORK" => Some(OrderStatus::Rework),
            _ => None,
        }
    }
}

// ==========================================
// 指令类型 (Command Kind)
// ==========================================
// 每条时间线记录携带触发指令,用于审计回溯
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    Start,                // 开工
    Assign,               // 指派 (仅属性变更,不改状态)
    UpdateStatus,         // 通用状态更新
    CompleteQualityCheck, // 质检完成
    PutOnHold,            // 挂起
    ResumeFromHold,       // 恢复
    Cancel,               // 取消
}

impl CommandKind {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Start => "Start",
            CommandKind::Assign => "Assign",
            CommandKind::UpdateStatus => "UpdateStatus",
            CommandKind::CompleteQualityCheck => "CompleteQualityCheck",
            CommandKind::PutOnHold => "PutOnHold",
            CommandKind::ResumeFromHold => "ResumeFromHold",
            CommandKind::Cancel => "Cancel",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Start" => Some(CommandKind::Start),
            "Assign" => Some(CommandKind::Assign),
            "UpdateStatus" => Some(CommandKind::UpdateStatus),
            "CompleteQualityCheck" => Some(CommandKind::CompleteQualityCheck),
            "PutOnHold" => Some(CommandKind::PutOnHold),
            "ResumeFromHold" => Some(CommandKind::ResumeFromHold),
            "Cancel" => Some(CommandKind::Cancel),
            _ => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
