// ==========================================
// 生产工单流转系统 - 工单领域模型
// ==========================================
// 红线: 状态只能由编排层经流转引擎授权后变更
// 对齐: production_order 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::OrderStatus;

// ==========================================
// ProductionOrder - 生产工单
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionOrder {
    // ===== 主键 (对齐schema) =====
    pub order_id: String, // 工单ID (UUID,不可变)

    // ===== 业务属性 =====
    pub product_name: String,        // 产品名称
    pub quantity: i32,               // 数量
    pub estimated_value: Option<f64>, // 预估产值 (用于驾驶舱汇总)

    // ===== 流转状态 =====
    pub status: OrderStatus,                       // 当前状态
    pub assigned_to: Option<String>,               // 指派员工
    pub estimated_completion: Option<NaiveDateTime>, // 预计完工时间
    pub hold_reason: Option<String>,               // 挂起原因 (仅 ON_HOLD 时有值)
    pub quality_check: Option<QualityCheckResult>, // 最近一次质检结果

    // ===== 时间戳 =====
    pub created_at: NaiveDateTime,         // 创建时间
    pub last_transition_at: NaiveDateTime, // 最后一次流转时间

    // ===== 并发控制 =====
    pub revision: i32, // 乐观锁版本号 (每次写入+1)
}

// ==========================================
// QualityCheckResult - 质检结果
// ==========================================
// 存储: production_order.quality_check_json (JSON)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityCheckResult {
    pub passed: bool,               // 是否合格
    pub checker_id: Option<String>, // 质检员ID
    pub notes: Option<String>,      // 质检备注
    pub checked_at: NaiveDateTime,  // 质检时间
}

// ==========================================
// ProductionOrder 辅助方法
// ==========================================
impl ProductionOrder {
    /// 创建新工单 (初始状态 PENDING, revision=0)
    ///
    /// # 参数
    /// - `product_name`: 产品名称
    /// - `quantity`: 数量
    pub fn new(product_name: String, quantity: i32) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            order_id: uuid::Uuid::new_v4().to_string(),
            product_name,
            quantity,
            estimated_value: None,
            status: OrderStatus::Pending,
            assigned_to: None,
            estimated_completion: None,
            hold_reason: None,
            quality_check: None,
            created_at: now,
            last_transition_at: now,
            revision: 0,
        }
    }

    /// 设置预计完工时间
    pub fn with_estimated_completion(mut self, at: NaiveDateTime) -> Self {
        self.estimated_completion = Some(at);
        self
    }

    /// 设置预估产值
    pub fn with_estimated_value(mut self, value: f64) -> Self {
        self.estimated_value = Some(value);
        self
    }

    /// 工单是否已关闭 (终态)
    pub fn is_closed(&self) -> bool {
        self.status.is_terminal()
    }

    /// 工单是否逾期 (非终态且预计完工时间已过)
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        if self.is_closed() {
            return false;
        }
        match self.estimated_completion {
            Some(due) => due < now,
            None => false,
        }
    }
}
