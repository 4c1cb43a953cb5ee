// ==========================================
// 生产工单流转系统 - 应用层
// ==========================================
// 职责: 装配共享状态,供二进制入口与宿主集成使用
// ==========================================

pub mod state;

pub use state::{get_default_db_path, AppState};
