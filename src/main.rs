// ==========================================
// 生产工单流转系统 - 主入口
// ==========================================
// 职责: 初始化日志/数据库/应用状态;
//       指令由宿主 (HTTP/桌面壳等) 调用 AppState 上的 API 发起
// ==========================================

use wip_workflow::app::{get_default_db_path, AppState};

fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    wip_workflow::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", wip_workflow::APP_NAME);
    tracing::info!("系统版本: {}", wip_workflow::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState
    let app_state = AppState::new(db_path)?;

    tracing::info!("AppState初始化成功");

    // 启动自检: 打印当前在制概览
    let dashboard = app_state
        .dashboard_api
        .get_wip_dashboard(None, None, None, None)
        .map_err(|e| anyhow::anyhow!("驾驶舱自检失败: {}", e))?;
    tracing::info!(
        total = dashboard.total_orders,
        overdue = dashboard.overdue_count,
        "在制概览就绪"
    );

    Ok(())
}
