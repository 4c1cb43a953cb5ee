// ==========================================
// 生产工单流转系统 - 状态流转表
// ==========================================
// 红线: 流转策略唯一来源,进程启动时构建一次,只读
// 调整策略需重新发布,不支持运行期修改
// ==========================================

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::domain::types::{CommandKind, OrderStatus};

// ==========================================
// TransitionRule - 单条流转规则
// ==========================================
#[derive(Debug, Clone)]
pub struct TransitionRule {
    /// 目标状态
    pub to: OrderStatus,
    /// 允许触发该流转的指令
    pub commands: &'static [CommandKind],
    /// 是否必须提供原因
    pub requires_reason: bool,
}

/// 流转表: 当前状态 -> 可达规则列表
///
/// 说明:
/// - 取消 (任意非终态 -> CANCELLED) 不在表内,由引擎作为逃逸通道单独校验,
///   保证 valid_next_states 恰好等于表行 (前端据此渲染常规动作,取消按钮独立)
/// - 质检两条边仅接受 CompleteQualityCheck,通用 UpdateStatus 不能绕过质检门
pub fn transition_table() -> &'static HashMap<OrderStatus, Vec<TransitionRule>> {
    static TABLE: OnceLock<HashMap<OrderStatus, Vec<TransitionRule>>> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

fn build_table() -> HashMap<OrderStatus, Vec<TransitionRule>> {
    use CommandKind::*;
    use OrderStatus::*;

    let mut table: HashMap<OrderStatus, Vec<TransitionRule>> = HashMap::new();

    table.insert(
        Pending,
        vec![rule(InProgress, &[Start, UpdateStatus], false)],
    );
    table.insert(
        InProgress,
        vec![
            rule(OnHold, &[PutOnHold, UpdateStatus], true),
            rule(QualityCheckPending, &[UpdateStatus], false),
        ],
    );
    table.insert(
        OnHold,
        vec![rule(InProgress, &[ResumeFromHold, UpdateStatus], false)],
    );
    table.insert(
        QualityCheckPending,
        vec![
            rule(Completed, &[CompleteQualityCheck], false),
            rule(Rework, &[CompleteQualityCheck], false),
        ],
    );
    table.insert(Rework, vec![rule(InProgress, &[UpdateStatus], false)]);

    // 终态无出边
    table.insert(Completed, vec![]);
    table.insert(Cancelled, vec![]);

    table
}

fn rule(
    to: OrderStatus,
    commands: &'static [CommandKind],
    requires_reason: bool,
) -> TransitionRule {
    TransitionRule {
        to,
        commands,
        requires_reason,
    }
}

/// 查询指定状态的出边规则 (终态返回空切片)
pub fn rules_from(from: OrderStatus) -> &'static [TransitionRule] {
    transition_table()
        .get(&from)
        .map(|rules| rules.as_slice())
        .unwrap_or(&[])
}
