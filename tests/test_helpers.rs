// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 创建临时测试数据库与已装配的API实例
// ==========================================

use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;

use wip_workflow::api::{DashboardApi, WorkflowApi};
use wip_workflow::db;
use wip_workflow::repository::{OrderRepository, TimelineRepository};

/// 创建临时测试数据库 (返回句柄防止提前删除)
pub fn create_test_db() -> anyhow::Result<(NamedTempFile, String)> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 测试环境: 临时库 + 已装配的API与仓储
pub struct TestEnv {
    pub _temp_file: NamedTempFile,
    pub workflow_api: Arc<WorkflowApi>,
    pub dashboard_api: Arc<DashboardApi>,
    pub order_repo: Arc<OrderRepository>,
    pub timeline_repo: Arc<TimelineRepository>,
}

/// 创建测试环境
pub fn setup_test_env() -> TestEnv {
    wip_workflow::logging::init_test();

    let (temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let conn = Arc::new(Mutex::new(
        db::open_sqlite_connection(&db_path).expect("打开测试数据库失败"),
    ));

    let order_repo = Arc::new(OrderRepository::new(conn.clone()));
    let timeline_repo = Arc::new(TimelineRepository::new(conn));
    let workflow_api = Arc::new(WorkflowApi::new(order_repo.clone(), timeline_repo.clone()));
    let dashboard_api = Arc::new(DashboardApi::new(order_repo.clone(), timeline_repo.clone()));

    TestEnv {
        _temp_file: temp_file,
        workflow_api,
        dashboard_api,
        order_repo,
        timeline_repo,
    }
}
