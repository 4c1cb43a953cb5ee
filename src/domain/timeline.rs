// ==========================================
// 生产工单流转系统 - 时间线领域模型
// ==========================================
// 红线: 时间线只追加,禁止修改与删除
// 用途: 审计追踪,逾期/时长分析,状态重放
// 对齐: order_timeline 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{CommandKind, OrderStatus};

/// 系统操作人 (无外部身份时使用)
pub const SYSTEM_ACTOR: &str = "System";

// ==========================================
// TimelineEntry - 时间线记录
// ==========================================
// 不变量: 同一工单的记录按 seq_no 严格递增,
//         从 PENDING 起重放 to_status 必须得到工单当前状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    // ===== 主键 (对齐schema) =====
    pub entry_id: String, // 记录ID (UUID)
    pub order_id: String, // 工单ID
    pub seq_no: i32,      // 工单内序号 (1起,写入事务内分配)

    // ===== 流转内容 =====
    pub from_status: OrderStatus, // 流转前状态
    pub to_status: OrderStatus,   // 流转后状态
    pub command: CommandKind,     // 触发指令
    pub actor: String,            // 操作人
    pub reason: Option<String>,   // 原因 (挂起/取消必填)
    pub notes: Option<String>,    // 备注

    // ===== 时间戳 =====
    pub created_at: NaiveDateTime, // 记录时间
}

impl TimelineEntry {
    /// 创建新的时间线记录 (seq_no 由仓储层在写入事务内分配)
    pub fn new(
        order_id: String,
        from_status: OrderStatus,
        to_status: OrderStatus,
        command: CommandKind,
        actor: String,
    ) -> Self {
        Self {
            entry_id: uuid::Uuid::new_v4().to_string(),
            order_id,
            seq_no: 0,
            from_status,
            to_status,
            command,
            actor,
            reason: None,
            notes: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// 设置原因
    pub fn with_reason(mut self, reason: String) -> Self {
        self.reason = Some(reason);
        self
    }

    /// 设置备注
    pub fn with_notes(mut self, notes: String) -> Self {
        self.notes = Some(notes);
        self
    }

    /// 是否为状态变更记录 (指派等属性操作 from==to,对重放中性)
    pub fn is_status_change(&self) -> bool {
        self.from_status != self.to_status
    }
}

/// 从 PENDING 起重放时间线,得到重建状态
///
/// # 参数
/// - `entries`: 同一工单的时间线记录 (须已按 seq_no 升序)
///
/// # 返回
/// 重放得到的状态;与工单存储状态不一致说明审计链被破坏
pub fn replay_status(entries: &[TimelineEntry]) -> OrderStatus {
    entries
        .iter()
        .fold(OrderStatus::Pending, |_, entry| entry.to_status)
}
