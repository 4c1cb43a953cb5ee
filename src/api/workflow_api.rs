// ==========================================
// 生产工单流转系统 - 工单编排 API
// ==========================================
// 职责: 用例层,接收指令并按统一骨架执行:
//       读取工单 -> 引擎授权 -> 落实副作用 -> 原子持久化(工单+时间线)
// 红线: 被拒绝的指令不持久化任何内容
// 架构: API 层 -> 引擎层 (WorkflowEngine) -> 仓储层
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::order::{ProductionOrder, QualityCheckResult};
use crate::domain::timeline::TimelineEntry;
use crate::domain::types::{CommandKind, OrderStatus};
use crate::engine::workflow::{SideEffect, TransitionDecision, WorkflowEngine};
use crate::repository::order_repo::{OrderFilter, OrderRepository};
use crate::repository::timeline_repo::TimelineRepository;

// ==========================================
// DTO 类型定义
// ==========================================

/// 创建工单请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub product_name: String,
    pub quantity: i32,
    pub estimated_completion: Option<NaiveDateTime>,
    pub estimated_value: Option<f64>,
}

/// 工单流转视图 (工单 + 当前合法动作)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowView {
    pub order: ProductionOrder,
    /// 流转表内的合法后继状态 (终态为空)
    pub valid_next_statuses: Vec<OrderStatus>,
    /// 取消逃逸通道是否可用 (非终态即可用)
    pub can_cancel: bool,
}

/// 员工负载统计
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeWorkload {
    /// 员工标识 (None 表示未指派桶)
    pub assigned_to: Option<String>,
    /// 非终态工单数
    pub active_count: i64,
    /// 其中逾期工单数
    pub overdue_count: i64,
}

/// 副作用执行上下文 (编排层收集,按引擎指令落实)
struct SideEffectContext {
    hold_reason: Option<String>,
    quality_check: Option<QualityCheckResult>,
}

impl SideEffectContext {
    fn empty() -> Self {
        Self {
            hold_reason: None,
            quality_check: None,
        }
    }
}

// ==========================================
// WorkflowApi - 工单编排 API
// ==========================================
pub struct WorkflowApi {
    order_repo: Arc<OrderRepository>,
    timeline_repo: Arc<TimelineRepository>,
    engine: WorkflowEngine,
}

impl WorkflowApi {
    /// 创建新的WorkflowApi实例
    pub fn new(order_repo: Arc<OrderRepository>, timeline_repo: Arc<TimelineRepository>) -> Self {
        Self {
            order_repo,
            timeline_repo,
            engine: WorkflowEngine::new(),
        }
    }

    // ==========================================
    // 指令接口
    // ==========================================

    /// 创建工单 (初始状态 PENDING,不写时间线,重放起点即 PENDING)
    ///
    /// # 参数
    /// - req: 创建请求
    /// - actor: 操作人
    ///
    /// # 返回
    /// - Ok(ProductionOrder): 新建工单
    /// - Err(ApiError): 参数校验或持久化错误
    pub fn create_order(
        &self,
        req: CreateOrderRequest,
        actor: &str,
    ) -> ApiResult<ProductionOrder> {
        if req.product_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("产品名称不能为空".to_string()));
        }
        if req.quantity <= 0 {
            return Err(ApiError::InvalidInput("数量必须大于0".to_string()));
        }

        let mut order = ProductionOrder::new(req.product_name, req.quantity);
        order.estimated_completion = req.estimated_completion;
        order.estimated_value = req.estimated_value;

        self.order_repo.insert(&order)?;
        tracing::info!(
            order_id = %order.order_id,
            actor = %actor,
            "工单创建成功"
        );
        Ok(order)
    }

    /// 开工: PENDING -> IN_PROGRESS,可同时指派员工/设置预计完工时间
    pub fn start_production(
        &self,
        order_id: &str,
        assigned_to: Option<&str>,
        estimated_completion: Option<NaiveDateTime>,
        actor: &str,
    ) -> ApiResult<ProductionOrder> {
        if let Some(assignee) = assigned_to {
            if assignee.trim().is_empty() {
                return Err(ApiError::ValidationError("指派员工不能为空".to_string()));
            }
        }

        let order = self.load(order_id)?;
        let decision =
            self.engine
                .authorize(order.status, CommandKind::Start, OrderStatus::InProgress, None)?;

        let mut updated = order.clone();
        if let Some(assignee) = assigned_to {
            updated.assigned_to = Some(assignee.to_string());
        }
        if estimated_completion.is_some() {
            updated.estimated_completion = estimated_completion;
        }

        self.commit(order, updated, decision, CommandKind::Start, actor, None, None)
    }

    /// 指派员工 (仅属性变更,不改状态;终态工单拒绝)
    ///
    /// 说明: 指派同样落时间线 (from==to,对重放中性),保证所有写入可审计
    pub fn assign_production(
        &self,
        order_id: &str,
        assigned_to: &str,
        actor: &str,
    ) -> ApiResult<ProductionOrder> {
        if assigned_to.trim().is_empty() {
            return Err(ApiError::ValidationError("指派员工不能为空".to_string()));
        }

        let order = self.load(order_id)?;
        self.engine.ensure_open(order.status)?;

        let mut updated = order.clone();
        updated.assigned_to = Some(assigned_to.to_string());
        updated.last_transition_at = chrono::Utc::now().naive_utc();

        let mut entry = TimelineEntry::new(
            order.order_id.clone(),
            order.status,
            order.status,
            CommandKind::Assign,
            actor.to_string(),
        )
        .with_notes(format!("指派给{}", assigned_to));

        let expected = order.revision;
        let new_revision = self
            .order_repo
            .update_with_timeline(&updated, expected, &mut entry)?;
        updated.revision = new_revision;

        tracing::info!(order_id = %order_id, assigned_to = %assigned_to, "工单指派成功");
        Ok(updated)
    }

    /// 通用状态更新 (与专用指令走同一张流转表)
    ///
    /// 约束: 目标为 CANCELLED 或 ON_HOLD 时 reason 必填 (引擎校验)
    pub fn update_production_status(
        &self,
        order_id: &str,
        new_status: OrderStatus,
        reason: Option<&str>,
        notes: Option<&str>,
        actor: &str,
    ) -> ApiResult<ProductionOrder> {
        let order = self.load(order_id)?;
        let decision =
            self.engine
                .authorize(order.status, CommandKind::UpdateStatus, new_status, reason)?;

        let updated = order.clone();
        self.commit(
            order,
            updated,
            decision,
            CommandKind::UpdateStatus,
            actor,
            reason,
            notes,
        )
    }

    /// 质检完成: QUALITY_CHECK_PENDING -> COMPLETED / REWORK
    ///
    /// 记录质检结果;其他状态下调用返回 InvalidTransition 且结果不被触碰
    pub fn complete_quality_check(
        &self,
        order_id: &str,
        passed: bool,
        notes: Option<&str>,
        checker_id: Option<&str>,
        actor: &str,
    ) -> ApiResult<ProductionOrder> {
        let order = self.load(order_id)?;
        let target = if passed {
            OrderStatus::Completed
        } else {
            OrderStatus::Rework
        };
        let decision = self.engine.authorize(
            order.status,
            CommandKind::CompleteQualityCheck,
            target,
            None,
        )?;

        let quality_check = QualityCheckResult {
            passed,
            checker_id: checker_id.map(|s| s.to_string()),
            notes: notes.map(|s| s.to_string()),
            checked_at: chrono::Utc::now().naive_utc(),
        };

        let updated = order.clone();
        self.commit_with_context(
            order,
            updated,
            decision,
            CommandKind::CompleteQualityCheck,
            actor,
            None,
            notes,
            SideEffectContext {
                hold_reason: None,
                quality_check: Some(quality_check),
            },
        )
    }

    /// 挂起: IN_PROGRESS -> ON_HOLD,原因必填
    pub fn put_on_hold(&self, order_id: &str, reason: &str, actor: &str) -> ApiResult<ProductionOrder> {
        let order = self.load(order_id)?;
        let decision = self.engine.authorize(
            order.status,
            CommandKind::PutOnHold,
            OrderStatus::OnHold,
            Some(reason),
        )?;

        let updated = order.clone();
        self.commit_with_context(
            order,
            updated,
            decision,
            CommandKind::PutOnHold,
            actor,
            Some(reason),
            None,
            SideEffectContext {
                hold_reason: Some(reason.to_string()),
                quality_check: None,
            },
        )
    }

    /// 恢复: ON_HOLD -> IN_PROGRESS,清除挂起原因
    pub fn resume_from_hold(&self, order_id: &str, actor: &str) -> ApiResult<ProductionOrder> {
        let order = self.load(order_id)?;
        let decision = self.engine.authorize(
            order.status,
            CommandKind::ResumeFromHold,
            OrderStatus::InProgress,
            None,
        )?;

        let updated = order.clone();
        self.commit(
            order,
            updated,
            decision,
            CommandKind::ResumeFromHold,
            actor,
            None,
            None,
        )
    }

    /// 取消: 任意非终态 -> CANCELLED,原因必填;终态返回 OrderClosed
    pub fn cancel_production(
        &self,
        order_id: &str,
        reason: &str,
        actor: &str,
    ) -> ApiResult<ProductionOrder> {
        let order = self.load(order_id)?;
        let decision = self.engine.authorize(
            order.status,
            CommandKind::Cancel,
            OrderStatus::Cancelled,
            Some(reason),
        )?;

        let updated = order.clone();
        self.commit(
            order,
            updated,
            decision,
            CommandKind::Cancel,
            actor,
            Some(reason),
            None,
        )
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询工单流转视图 (工单 + 合法后继状态)
    pub fn get_production_workflow(&self, order_id: &str) -> ApiResult<WorkflowView> {
        let order = self.load(order_id)?;
        let valid_next_statuses = self.engine.valid_next_states(order.status);
        let can_cancel = !order.status.is_terminal();
        Ok(WorkflowView {
            order,
            valid_next_statuses,
            can_cancel,
        })
    }

    /// 查询工单的完整时间线 (按 seq_no 升序)
    pub fn get_production_timeline(&self, order_id: &str) -> ApiResult<Vec<TimelineEntry>> {
        // 先确认工单存在,与"空时间线"区分
        self.load(order_id)?;
        Ok(self.timeline_repo.find_by_order(order_id)?)
    }

    /// 查询工单当前的合法后继状态 (流转表行,终态为空)
    pub fn get_valid_next_statuses(&self, order_id: &str) -> ApiResult<Vec<OrderStatus>> {
        let order = self.load(order_id)?;
        Ok(self.engine.valid_next_states(order.status))
    }

    /// 员工负载统计: 非终态工单按指派员工分组
    ///
    /// # 返回
    /// 每员工的在制工单数与逾期数;未指派工单归入 assigned_to=None 桶
    pub fn get_employee_workload(&self) -> ApiResult<Vec<EmployeeWorkload>> {
        let filter = OrderFilter {
            statuses: Some(active_statuses()),
            ..Default::default()
        };
        let orders = self.order_repo.query(&filter)?;
        let now = chrono::Utc::now().naive_utc();

        let mut buckets: HashMap<Option<String>, (i64, i64)> = HashMap::new();
        for order in &orders {
            let bucket = buckets.entry(order.assigned_to.clone()).or_insert((0, 0));
            bucket.0 += 1;
            if order.is_overdue(now) {
                bucket.1 += 1;
            }
        }

        let mut workloads: Vec<EmployeeWorkload> = buckets
            .into_iter()
            .map(|(assigned_to, (active_count, overdue_count))| EmployeeWorkload {
                assigned_to,
                active_count,
                overdue_count,
            })
            .collect();
        // 负载降序,未指派桶排最后
        workloads.sort_by(|a, b| {
            match (&a.assigned_to, &b.assigned_to) {
                (None, None) => std::cmp::Ordering::Equal,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (Some(_), None) => std::cmp::Ordering::Less,
                (Some(x), Some(y)) => b
                    .active_count
                    .cmp(&a.active_count)
                    .then_with(|| x.cmp(y)),
            }
        });
        Ok(workloads)
    }

    // ==========================================
    // 内部骨架
    // ==========================================

    /// 读取工单,不存在即 OrderNotFound
    fn load(&self, order_id: &str) -> ApiResult<ProductionOrder> {
        if order_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("工单ID不能为空".to_string()));
        }
        self.order_repo
            .find_by_id(order_id)?
            .ok_or_else(|| ApiError::OrderNotFound(format!("工单{}不存在", order_id)))
    }

    /// 无额外副作用上下文的提交
    #[allow(clippy::too_many_arguments)]
    fn commit(
        &self,
        before: ProductionOrder,
        updated: ProductionOrder,
        decision: TransitionDecision,
        command: CommandKind,
        actor: &str,
        reason: Option<&str>,
        notes: Option<&str>,
    ) -> ApiResult<ProductionOrder> {
        self.commit_with_context(
            before,
            updated,
            decision,
            command,
            actor,
            reason,
            notes,
            SideEffectContext::empty(),
        )
    }

    /// 统一提交骨架: 落实副作用 -> 原子持久化(工单 UPDATE + 时间线 INSERT)
    ///
    /// 失败 (含乐观锁冲突) 时不产生任何持久化效果
    #[allow(clippy::too_many_arguments)]
    fn commit_with_context(
        &self,
        before: ProductionOrder,
        mut updated: ProductionOrder,
        decision: TransitionDecision,
        command: CommandKind,
        actor: &str,
        reason: Option<&str>,
        notes: Option<&str>,
        ctx: SideEffectContext,
    ) -> ApiResult<ProductionOrder> {
        updated.status = decision.new_state;
        updated.last_transition_at = chrono::Utc::now().naive_utc();

        for effect in &decision.side_effects {
            match effect {
                SideEffect::SetHoldReason => {
                    updated.hold_reason = ctx.hold_reason.clone().or_else(|| {
                        reason.map(|r| r.to_string())
                    });
                }
                SideEffect::ClearHoldReason => updated.hold_reason = None,
                SideEffect::RecordQualityCheck => {
                    updated.quality_check = ctx.quality_check.clone();
                }
                SideEffect::ClearAssignee => updated.assigned_to = None,
            }
        }

        let mut entry = TimelineEntry::new(
            before.order_id.clone(),
            before.status,
            decision.new_state,
            command,
            actor.to_string(),
        );
        if let Some(r) = reason {
            entry = entry.with_reason(r.to_string());
        }
        if let Some(n) = notes {
            entry = entry.with_notes(n.to_string());
        }

        let expected = before.revision;
        let new_revision = self
            .order_repo
            .update_with_timeline(&updated, expected, &mut entry)?;
        updated.revision = new_revision;

        tracing::info!(
            order_id = %updated.order_id,
            command = %command,
            from = %before.status,
            to = %updated.status,
            actor = %actor,
            "工单流转成功"
        );
        Ok(updated)
    }
}

/// 非终态状态集合
pub fn active_statuses() -> Vec<OrderStatus> {
    OrderStatus::ALL
        .iter()
        .copied()
        .filter(|s| !s.is_terminal())
        .collect()
}
