// ==========================================
// 生产工单流转系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 生产工单全生命周期流转与审计
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 流转策略与授权
pub mod engine;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    replay_status, CommandKind, OrderStatus, ProductionOrder, QualityCheckResult, TimelineEntry,
    SYSTEM_ACTOR,
};

// 引擎
pub use engine::{SideEffect, TransitionDecision, TransitionError, WorkflowEngine};

// API
pub use api::{ApiError, DashboardApi, ResponseEnvelope, WorkflowApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "生产工单流转系统";
