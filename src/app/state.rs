// ==========================================
// 生产工单流转系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{DashboardApi, WorkflowApi};
use crate::db;
use crate::repository::{OrderRepository, TimelineRepository};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 工单编排API
    pub workflow_api: Arc<WorkflowApi>,

    /// 驾驶舱API
    pub dashboard_api: Arc<DashboardApi>,
}

impl AppState {
    /// 初始化应用状态: 打开数据库、建表、装配仓储与API
    pub fn new(db_path: String) -> anyhow::Result<Self> {
        let conn = db::open_sqlite_connection(&db_path)?;
        db::init_schema(&conn)?;

        let conn = Arc::new(Mutex::new(conn));
        let order_repo = Arc::new(OrderRepository::new(conn.clone()));
        let timeline_repo = Arc::new(TimelineRepository::new(conn));

        let workflow_api = Arc::new(WorkflowApi::new(order_repo.clone(), timeline_repo.clone()));
        let dashboard_api = Arc::new(DashboardApi::new(order_repo, timeline_repo));

        Ok(Self {
            db_path,
            workflow_api,
            dashboard_api,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先使用 WIP_DB_PATH 环境变量,否则落在系统数据目录下
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("WIP_DB_PATH") {
        return path;
    }

    let base = dirs::data_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    let dir = base.join("wip-workflow");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!("创建数据目录失败,回退到当前目录: {}", e);
        return "wip_workflow.db".to_string();
    }
    dir.join("wip_workflow.db").to_string_lossy().to_string()
}
