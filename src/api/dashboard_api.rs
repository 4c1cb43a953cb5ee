// ==========================================
// 生产工单流转系统 - 驾驶舱 API
// ==========================================
// 职责: 只读聚合查询 (在制概览/活跃工单/逾期工单)
// 红线: 聚合查询绝不触发流转,可与写入并行,容忍快照级滞后
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::workflow_api::active_statuses;
use crate::domain::order::ProductionOrder;
use crate::domain::timeline::TimelineEntry;
use crate::domain::types::OrderStatus;
use crate::repository::order_repo::{OrderFilter, OrderRepository};
use crate::repository::timeline_repo::TimelineRepository;

/// 最近工单列表默认上限
const DEFAULT_RECENT_LIMIT: usize = 10;

// ==========================================
// DTO 类型定义
// ==========================================

/// 在制概览
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WipDashboard {
    /// 窗口内工单总数
    pub total_orders: i64,
    /// 分状态计数 (全部 7 个状态,缺省为 0)
    pub status_counts: Vec<StatusCount>,
    /// 窗口内预估产值合计
    pub total_estimated_value: f64,
    /// 其中非终态工单的预估产值
    pub active_estimated_value: f64,
    /// 逾期工单数
    pub overdue_count: i64,
    /// 最近创建的工单 (有界列表)
    pub recent_orders: Vec<ProductionOrder>,
}

/// 单状态计数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// 逾期工单 (按逾期时长降序)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueProduction {
    pub order: ProductionOrder,
    /// 逾期小时数
    pub overdue_hours: i64,
}

// ==========================================
// DashboardApi - 驾驶舱 API
// ==========================================
pub struct DashboardApi {
    order_repo: Arc<OrderRepository>,
    timeline_repo: Arc<TimelineRepository>,
}

impl DashboardApi {
    /// 创建新的DashboardApi实例
    pub fn new(order_repo: Arc<OrderRepository>, timeline_repo: Arc<TimelineRepository>) -> Self {
        Self {
            order_repo,
            timeline_repo,
        }
    }

    /// 在制概览: 按创建窗口与指派员工过滤,输出分状态计数与产值汇总
    ///
    /// # 参数
    /// - from_date / to_date: 创建时间窗口 (可选,含边界)
    /// - assigned_to: 指派员工过滤 (可选)
    /// - recent_limit: 最近工单列表上限 (可选,1-100,默认10)
    pub fn get_wip_dashboard(
        &self,
        from_date: Option<NaiveDateTime>,
        to_date: Option<NaiveDateTime>,
        assigned_to: Option<&str>,
        recent_limit: Option<usize>,
    ) -> ApiResult<WipDashboard> {
        if let (Some(from), Some(to)) = (from_date, to_date) {
            if from > to {
                return Err(ApiError::InvalidInput(
                    "开始时间不能晚于结束时间".to_string(),
                ));
            }
        }
        let limit = recent_limit.unwrap_or(DEFAULT_RECENT_LIMIT);
        if limit == 0 || limit > 100 {
            return Err(ApiError::InvalidInput("limit必须在1-100之间".to_string()));
        }

        let filter = OrderFilter {
            statuses: None,
            assigned_to: assigned_to.map(|s| s.to_string()),
            created_from: from_date,
            created_to: to_date,
        };
        let orders = self.order_repo.query(&filter)?;
        let now = chrono::Utc::now().naive_utc();

        let mut counts: HashMap<OrderStatus, i64> = HashMap::new();
        let mut total_estimated_value = 0.0;
        let mut active_estimated_value = 0.0;
        let mut overdue_count = 0;
        for order in &orders {
            *counts.entry(order.status).or_insert(0) += 1;
            if let Some(value) = order.estimated_value {
                total_estimated_value += value;
                if !order.is_closed() {
                    active_estimated_value += value;
                }
            }
            if order.is_overdue(now) {
                overdue_count += 1;
            }
        }

        // 固定顺序输出全部状态,前端不必补零
        let status_counts = OrderStatus::ALL
            .iter()
            .map(|status| StatusCount {
                status: *status,
                count: counts.get(status).copied().unwrap_or(0),
            })
            .collect();

        // query 已按创建时间倒序
        let recent_orders = orders.iter().take(limit).cloned().collect();

        Ok(WipDashboard {
            total_orders: orders.len() as i64,
            status_counts,
            total_estimated_value,
            active_estimated_value,
            overdue_count,
            recent_orders,
        })
    }

    /// 活跃工单: 非终态工单,可按指派员工/状态过滤
    pub fn get_active_productions(
        &self,
        assigned_to: Option<&str>,
        status: Option<OrderStatus>,
    ) -> ApiResult<Vec<ProductionOrder>> {
        let statuses = match status {
            Some(s) if s.is_terminal() => {
                return Err(ApiError::InvalidInput(format!(
                    "{}为终态,不属于活跃工单",
                    s
                )));
            }
            Some(s) => vec![s],
            None => active_statuses(),
        };

        let filter = OrderFilter {
            statuses: Some(statuses),
            assigned_to: assigned_to.map(|s| s.to_string()),
            ..Default::default()
        };
        Ok(self.order_repo.query(&filter)?)
    }

    /// 逾期工单: 活跃工单中预计完工时间已过者,按逾期时长降序
    pub fn get_overdue_productions(&self) -> ApiResult<Vec<OverdueProduction>> {
        let filter = OrderFilter {
            statuses: Some(active_statuses()),
            ..Default::default()
        };
        let orders = self.order_repo.query(&filter)?;
        let now = chrono::Utc::now().naive_utc();

        let mut overdue: Vec<OverdueProduction> = orders
            .into_iter()
            .filter(|order| order.is_overdue(now))
            .map(|order| {
                let due = order
                    .estimated_completion
                    .unwrap_or(now); // is_overdue 已保证 Some
                OverdueProduction {
                    overdue_hours: (now - due).num_hours(),
                    order,
                }
            })
            .collect();

        overdue.sort_by(|a, b| b.overdue_hours.cmp(&a.overdue_hours));
        Ok(overdue)
    }

    /// 最近流转记录 (跨工单,驾驶舱活动流)
    pub fn get_recent_activity(&self, limit: i32) -> ApiResult<Vec<TimelineEntry>> {
        Ok(self.timeline_repo.find_recent(limit)?)
    }
}
