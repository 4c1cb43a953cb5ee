// ==========================================
// 生产工单流转系统 - 流转引擎
// ==========================================
// 职责: 纯决策组件,输入当前状态与请求,输出授权结果或拒绝
// 红线: 无状态,不访问数据库,不产生副作用
// 副作用以声明式指令返回,由编排层执行
// ==========================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::types::{CommandKind, OrderStatus};
use crate::engine::transition_table::rules_from;

// ==========================================
// TransitionError - 流转拒绝原因
// ==========================================
// NoOpTransition 与 InvalidTransition 区分,
// 便于调用方安全忽略重复指令
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    #[error("无效的状态流转: from={from} to={to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("重复流转: 工单已处于状态 {state}")]
    NoOpTransition { state: OrderStatus },

    #[error("工单已关闭: 状态 {state} 不再接受指令")]
    OrderClosed { state: OrderStatus },

    #[error("缺少必填原因: 流转到 {to} 必须提供原因")]
    MissingReason { to: OrderStatus },
}

// ==========================================
// SideEffect - 声明式副作用指令
// ==========================================
// 引擎只决定"需要做什么",由编排层落实到工单属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideEffect {
    SetHoldReason,      // 记录挂起原因
    ClearHoldReason,    // 清除挂起原因
    RecordQualityCheck, // 记录质检结果
    ClearAssignee,      // 取消时清除指派
}

// ==========================================
// TransitionDecision - 授权结果
// ==========================================
#[derive(Debug, Clone)]
pub struct TransitionDecision {
    /// 授权后的新状态
    pub new_state: OrderStatus,
    /// 编排层需执行的副作用
    pub side_effects: Vec<SideEffect>,
}

// ==========================================
// WorkflowEngine - 流转引擎
// ==========================================
pub struct WorkflowEngine;

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowEngine {
    /// 创建流转引擎 (无状态,可任意共享)
    pub fn new() -> Self {
        Self
    }

    /// 授权一次状态流转
    ///
    /// # 参数
    /// - `current`: 工单当前状态
    /// - `command`: 触发指令
    /// - `target`: 请求的目标状态
    /// - `reason`: 原因 (挂起/取消必填)
    ///
    /// # 返回
    /// - `Ok(TransitionDecision)`: 新状态 + 待执行副作用
    /// - `Err(TransitionError)`: 拒绝原因 (被拒绝的请求不得产生任何副作用)
    ///
    /// # 校验顺序
    /// 终态 -> 重复流转 -> 取消逃逸通道 -> 流转表 -> 原因必填
    pub fn authorize(
        &self,
        current: OrderStatus,
        command: CommandKind,
        target: OrderStatus,
        reason: Option<&str>,
    ) -> Result<TransitionDecision, TransitionError> {
        if current.is_terminal() {
            return Err(TransitionError::OrderClosed { state: current });
        }

        if target == current {
            return Err(TransitionError::NoOpTransition { state: current });
        }

        // 取消: 任意非终态可达的逃逸通道,不走流转表
        if target == OrderStatus::Cancelled {
            if !matches!(command, CommandKind::Cancel | CommandKind::UpdateStatus) {
                return Err(TransitionError::InvalidTransition {
                    from: current,
                    to: target,
                });
            }
            Self::require_reason(reason, target)?;
            let mut side_effects = vec![SideEffect::ClearAssignee];
            if current == OrderStatus::OnHold {
                side_effects.push(SideEffect::ClearHoldReason);
            }
            return Ok(TransitionDecision {
                new_state: OrderStatus::Cancelled,
                side_effects,
            });
        }

        let rule = rules_from(current)
            .iter()
            .find(|rule| rule.to == target && rule.commands.contains(&command))
            .ok_or(TransitionError::InvalidTransition {
                from: current,
                to: target,
            })?;

        if rule.requires_reason {
            Self::require_reason(reason, target)?;
        }

        let mut side_effects = Vec::new();
        match target {
            OrderStatus::OnHold => side_effects.push(SideEffect::SetHoldReason),
            OrderStatus::Completed | OrderStatus::Rework => {
                side_effects.push(SideEffect::RecordQualityCheck)
            }
            _ => {}
        }
        if current == OrderStatus::OnHold {
            side_effects.push(SideEffect::ClearHoldReason);
        }

        Ok(TransitionDecision {
            new_state: target,
            side_effects,
        })
    }

    /// 查询当前状态的合法后继状态 (流转表行,终态为空)
    ///
    /// 说明: 取消作为独立逃逸通道不在返回值内,
    /// 前端据此只渲染常规动作,取消入口单独判断 is_terminal
    pub fn valid_next_states(&self, current: OrderStatus) -> Vec<OrderStatus> {
        rules_from(current).iter().map(|rule| rule.to).collect()
    }

    /// 属性类指令 (如指派) 的开放性校验: 终态工单拒绝
    pub fn ensure_open(&self, current: OrderStatus) -> Result<(), TransitionError> {
        if current.is_terminal() {
            return Err(TransitionError::OrderClosed { state: current });
        }
        Ok(())
    }

    fn require_reason(reason: Option<&str>, to: OrderStatus) -> Result<(), TransitionError> {
        match reason {
            Some(r) if !r.trim().is_empty() => Ok(()),
            _ => Err(TransitionError::MissingReason { to }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    fn engine() -> WorkflowEngine {
        WorkflowEngine::new()
    }

    #[test]
    fn test_start_from_pending() {
        let decision = engine()
            .authorize(Pending, CommandKind::Start, InProgress, None)
            .unwrap();
        assert_eq!(decision.new_state, InProgress);
        assert!(decision.side_effects.is_empty());
    }

    #[test]
    fn test_invalid_pairs_exhaustive() {
        // 表外组合 (目标非取消、非自身) 一律 InvalidTransition
        let eng = engine();
        for from in OrderStatus::ALL {
            if from.is_terminal() {
                continue;
            }
            let allowed: Vec<OrderStatus> = eng.valid_next_states(from);
            for to in OrderStatus::ALL {
                if to == from || to == Cancelled || allowed.contains(&to) {
                    continue;
                }
                let result = eng.authorize(from, CommandKind::UpdateStatus, to, Some("理由"));
                assert_eq!(
                    result.unwrap_err(),
                    TransitionError::InvalidTransition { from, to },
                    "{} -> {} 应被拒绝",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_noop_transition_is_distinct() {
        let err = engine()
            .authorize(InProgress, CommandKind::UpdateStatus, InProgress, None)
            .unwrap_err();
        assert_eq!(err, TransitionError::NoOpTransition { state: InProgress });
    }

    #[test]
    fn test_terminal_rejects_everything() {
        for state in [Completed, Cancelled] {
            let err = engine()
                .authorize(state, CommandKind::Cancel, Cancelled, Some("重复取消"))
                .unwrap_err();
            assert_eq!(err, TransitionError::OrderClosed { state });
        }
    }

    #[test]
    fn test_hold_requires_reason() {
        let eng = engine();
        let err = eng
            .authorize(InProgress, CommandKind::PutOnHold, OnHold, None)
            .unwrap_err();
        assert_eq!(err, TransitionError::MissingReason { to: OnHold });

        let err = eng
            .authorize(InProgress, CommandKind::PutOnHold, OnHold, Some("  "))
            .unwrap_err();
        assert_eq!(err, TransitionError::MissingReason { to: OnHold });

        let decision = eng
            .authorize(InProgress, CommandKind::PutOnHold, OnHold, Some("缺料"))
            .unwrap();
        assert_eq!(decision.side_effects, vec![SideEffect::SetHoldReason]);
    }

    #[test]
    fn test_resume_clears_hold_reason() {
        let decision = engine()
            .authorize(OnHold, CommandKind::ResumeFromHold, InProgress, None)
            .unwrap();
        assert_eq!(decision.new_state, InProgress);
        assert_eq!(decision.side_effects, vec![SideEffect::ClearHoldReason]);
    }

    #[test]
    fn test_cancel_from_every_non_terminal() {
        let eng = engine();
        for from in [Pending, InProgress, OnHold, QualityCheckPending, Rework] {
            let decision = eng
                .authorize(from, CommandKind::Cancel, Cancelled, Some("客户撤单"))
                .unwrap();
            assert_eq!(decision.new_state, Cancelled);
            assert!(decision.side_effects.contains(&SideEffect::ClearAssignee));
        }
    }

    #[test]
    fn test_cancel_requires_reason() {
        let err = engine()
            .authorize(Pending, CommandKind::Cancel, Cancelled, None)
            .unwrap_err();
        assert_eq!(err, TransitionError::MissingReason { to: Cancelled });
    }

    #[test]
    fn test_quality_gate_only_via_check_command() {
        let eng = engine();
        // UpdateStatus 不能绕过质检门直达 COMPLETED
        let err = eng
            .authorize(QualityCheckPending, CommandKind::UpdateStatus, Completed, None)
            .unwrap_err();
        assert!(matches!(err, TransitionError::InvalidTransition { .. }));

        let decision = eng
            .authorize(
                QualityCheckPending,
                CommandKind::CompleteQualityCheck,
                Rework,
                None,
            )
            .unwrap();
        assert_eq!(decision.side_effects, vec![SideEffect::RecordQualityCheck]);
    }

    #[test]
    fn test_valid_next_states_matches_table() {
        let eng = engine();
        assert_eq!(
            eng.valid_next_states(QualityCheckPending),
            vec![Completed, Rework]
        );
        assert_eq!(eng.valid_next_states(Pending), vec![InProgress]);
        assert!(eng.valid_next_states(Completed).is_empty());
        assert!(eng.valid_next_states(Cancelled).is_empty());
    }

    #[test]
    fn test_ensure_open() {
        let eng = engine();
        assert!(eng.ensure_open(InProgress).is_ok());
        assert!(matches!(
            eng.ensure_open(Completed),
            Err(TransitionError::OrderClosed { .. })
        ));
    }
}
