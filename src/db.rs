// ==========================================
// 生产工单流转系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为,避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout(毫秒)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema (幂等)
///
/// 表结构:
/// - production_order: 工单当前态 + 乐观锁 revision
/// - order_timeline: 只追加审计时间线,UNIQUE(order_id, seq_no)
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS production_order (
            order_id              TEXT PRIMARY KEY,
            product_name          TEXT NOT NULL,
            quantity              INTEGER NOT NULL DEFAULT 1,
            estimated_value       REAL,
            status                TEXT NOT NULL,
            assigned_to           TEXT,
            estimated_completion  TEXT,
            hold_reason           TEXT,
            quality_check_json    TEXT,
            created_at            TEXT NOT NULL,
            last_transition_at    TEXT NOT NULL,
            revision              INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_order_status
            ON production_order(status);
        CREATE INDEX IF NOT EXISTS idx_order_assigned_to
            ON production_order(assigned_to);

        CREATE TABLE IF NOT EXISTS order_timeline (
            entry_id     TEXT PRIMARY KEY,
            order_id     TEXT NOT NULL REFERENCES production_order(order_id),
            seq_no       INTEGER NOT NULL,
            from_status  TEXT NOT NULL,
            to_status    TEXT NOT NULL,
            command      TEXT NOT NULL,
            actor        TEXT NOT NULL,
            reason       TEXT,
            notes        TEXT,
            created_at   TEXT NOT NULL,
            UNIQUE(order_id, seq_no)
        );

        CREATE INDEX IF NOT EXISTS idx_timeline_order
            ON order_timeline(order_id, seq_no);
        "#,
    )
}
