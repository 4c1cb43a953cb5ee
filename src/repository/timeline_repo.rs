// ==========================================
// 生产工单流转系统 - 时间线仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 红线: 时间线只追加,不提供 UPDATE/DELETE
// ==========================================

use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

use crate::domain::timeline::TimelineEntry;
use crate::domain::types::{CommandKind, OrderStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// TimelineRepository - 时间线仓储
// ==========================================
pub struct TimelineRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TimelineRepository {
    /// 创建新的时间线仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询工单的完整时间线 (按 seq_no 升序)
    pub fn find_by_order(&self, order_id: &str) -> RepositoryResult<Vec<TimelineEntry>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT entry_id, order_id, seq_no, from_status, to_status,
                      command, actor, reason, notes, created_at
               FROM order_timeline
               WHERE order_id = ?
               ORDER BY seq_no ASC"#,
        )?;

        let entries = stmt
            .query_map(params![order_id], map_row)?
            .collect::<Result<Vec<TimelineEntry>, _>>()?;

        Ok(entries)
    }

    /// 统计工单的时间线记录数
    pub fn count_by_order(&self, order_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM order_timeline WHERE order_id = ?",
            params![order_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 查询最近的流转记录 (跨工单,驾驶舱用)
    pub fn find_recent(&self, limit: i32) -> RepositoryResult<Vec<TimelineEntry>> {
        if limit <= 0 || limit > 1000 {
            return Err(RepositoryError::ValidationError(
                "limit必须在1-1000之间".to_string(),
            ));
        }
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT entry_id, order_id, seq_no, from_status, to_status,
                      command, actor, reason, notes, created_at
               FROM order_timeline
               ORDER BY created_at DESC, seq_no DESC
               LIMIT ?"#,
        )?;

        let entries = stmt
            .query_map(params![limit], map_row)?
            .collect::<Result<Vec<TimelineEntry>, _>>()?;

        Ok(entries)
    }
}

/// 在既有事务内追加一条时间线记录
///
/// 说明:
/// - seq_no 在事务内按 MAX(seq_no)+1 分配,保证同一工单内严格递增
/// - 与工单 UPDATE 同一事务提交,保证"工单已流转但无审计记录"不可能发生
pub(super) fn insert_entry_tx(
    tx: &Transaction<'_>,
    entry: &mut TimelineEntry,
) -> RepositoryResult<()> {
    let max_seq: Option<i32> = tx.query_row(
        "SELECT MAX(seq_no) FROM order_timeline WHERE order_id = ?",
        params![&entry.order_id],
        |row| row.get(0),
    )?;
    entry.seq_no = max_seq.unwrap_or(0) + 1;

    tx.execute(
        r#"INSERT INTO order_timeline (
            entry_id, order_id, seq_no, from_status, to_status,
            command, actor, reason, notes, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        params![
            &entry.entry_id,
            &entry.order_id,
            &entry.seq_no,
            entry.from_status.to_db_str(),
            entry.to_status.to_db_str(),
            entry.command.as_str(),
            &entry.actor,
            &entry.reason,
            &entry.notes,
            entry.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;

    Ok(())
}

/// 映射数据库行到 TimelineEntry
fn map_row(row: &rusqlite::Row) -> rusqlite::Result<TimelineEntry> {
    let from_str: String = row.get(3)?;
    let to_str: String = row.get(4)?;
    let command_str: String = row.get(5)?;
    Ok(TimelineEntry {
        entry_id: row.get(0)?,
        order_id: row.get(1)?,
        seq_no: row.get(2)?,
        from_status: parse_status(&from_str, 3)?,
        to_status: parse_status(&to_str, 4)?,
        command: CommandKind::from_str(&command_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                format!("未知指令类型: {}", command_str).into(),
            )
        })?,
        actor: row.get(6)?,
        reason: row.get(7)?,
        notes: row.get(8)?,
        created_at: chrono::NaiveDateTime::parse_from_str(
            &row.get::<_, String>(9)?,
            DATETIME_FMT,
        )
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
        })?,
    })
}

fn parse_status(s: &str, idx: usize) -> rusqlite::Result<OrderStatus> {
    OrderStatus::from_db_str(s).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("未知工单状态: {}", s).into(),
        )
    })
}
