// ==========================================
// 生产工单流转系统 - 工单仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 并发控制: 乐观锁 (revision 列),WHERE 子句内比对
// 原子性: 工单 UPDATE 与时间线 INSERT 同一事务
// ==========================================

use chrono::NaiveDateTime;
use rusqlite::{params, params_from_iter, Connection};
use std::sync::{Arc, Mutex};

use crate::domain::order::{ProductionOrder, QualityCheckResult};
use crate::domain::timeline::TimelineEntry;
use crate::domain::types::OrderStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::timeline_repo::insert_entry_tx;

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// OrderFilter - 工单查询过滤条件
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// 状态过滤 (None 表示不过滤)
    pub statuses: Option<Vec<OrderStatus>>,
    /// 指派员工过滤
    pub assigned_to: Option<String>,
    /// 创建时间下限 (含)
    pub created_from: Option<NaiveDateTime>,
    /// 创建时间上限 (含)
    pub created_to: Option<NaiveDateTime>,
}

// ==========================================
// OrderRepository - 工单仓储
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    /// 创建新的工单仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入新工单
    pub fn insert(&self, order: &ProductionOrder) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO production_order (
                order_id, product_name, quantity, estimated_value,
                status, assigned_to, estimated_completion, hold_reason,
                quality_check_json, created_at, last_transition_at, revision
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &order.order_id,
                &order.product_name,
                &order.quantity,
                &order.estimated_value,
                order.status.to_db_str(),
                &order.assigned_to,
                &order
                    .estimated_completion
                    .map(|t| t.format(DATETIME_FMT).to_string()),
                &order.hold_reason,
                quality_check_to_json(&order.quality_check)?,
                order.created_at.format(DATETIME_FMT).to_string(),
                order.last_transition_at.format(DATETIME_FMT).to_string(),
                &order.revision,
            ],
        )?;

        Ok(order.order_id.clone())
    }

    /// 更新工单并追加时间线记录 (单事务,带乐观锁检查)
    ///
    /// # 参数
    /// - `order`: 更新后的工单 (revision 字段为写入前读取到的值)
    /// - `expected_revision`: 读取时的 revision,WHERE 子句内比对
    /// - `entry`: 时间线记录 (seq_no 由本方法在事务内分配)
    ///
    /// # 并发控制
    /// revision 不匹配说明工单已被其他指令修改,返回 OptimisticLockFailure,
    /// 调用方须重新读取后重发指令
    ///
    /// # 原子性
    /// 工单 UPDATE 与时间线 INSERT 要么同时生效要么同时回滚
    pub fn update_with_timeline(
        &self,
        order: &ProductionOrder,
        expected_revision: i32,
        entry: &mut TimelineEntry,
    ) -> RepositoryResult<i32> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let rows_affected = tx.execute(
            r#"UPDATE production_order
               SET status = ?, assigned_to = ?, estimated_completion = ?,
                   hold_reason = ?, quality_check_json = ?,
                   last_transition_at = ?, revision = revision + 1
               WHERE order_id = ? AND revision = ?"#,
            params![
                order.status.to_db_str(),
                &order.assigned_to,
                &order
                    .estimated_completion
                    .map(|t| t.format(DATETIME_FMT).to_string()),
                &order.hold_reason,
                quality_check_to_json(&order.quality_check)?,
                order.last_transition_at.format(DATETIME_FMT).to_string(),
                &order.order_id,
                &expected_revision,
            ],
        )?;

        if rows_affected == 0 {
            // 判断是记录不存在还是revision冲突
            let actual: Result<i32, _> = tx.query_row(
                "SELECT revision FROM production_order WHERE order_id = ?",
                params![&order.order_id],
                |row| row.get(0),
            );

            return match actual {
                Ok(actual_revision) => Err(RepositoryError::OptimisticLockFailure {
                    order_id: order.order_id.clone(),
                    expected: expected_revision,
                    actual: actual_revision,
                }),
                Err(_) => Err(RepositoryError::NotFound {
                    entity: "ProductionOrder".to_string(),
                    id: order.order_id.clone(),
                }),
            };
        }

        insert_entry_tx(&tx, entry)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(expected_revision + 1)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 order_id 查询工单
    pub fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<ProductionOrder>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("{} WHERE order_id = ?", SELECT_ORDER),
            params![order_id],
            map_row,
        ) {
            Ok(order) => Ok(Some(order)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按过滤条件查询工单 (按创建时间倒序)
    pub fn query(&self, filter: &OrderFilter) -> RepositoryResult<Vec<ProductionOrder>> {
        let conn = self.get_conn()?;

        let mut sql = SELECT_ORDER.to_string();
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(statuses) = &filter.statuses {
            if statuses.is_empty() {
                return Ok(vec![]);
            }
            let placeholders: Vec<&str> = statuses.iter().map(|_| "?").collect();
            clauses.push(format!("status IN ({})", placeholders.join(", ")));
            params.extend(statuses.iter().map(|s| s.to_db_str().to_string()));
        }
        if let Some(assigned_to) = &filter.assigned_to {
            clauses.push("assigned_to = ?".to_string());
            params.push(assigned_to.clone());
        }
        if let Some(from) = &filter.created_from {
            clauses.push("created_at >= ?".to_string());
            params.push(from.format(DATETIME_FMT).to_string());
        }
        if let Some(to) = &filter.created_to {
            clauses.push("created_at <= ?".to_string());
            params.push(to.format(DATETIME_FMT).to_string());
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params_from_iter(params.iter()), map_row)?
            .collect::<Result<Vec<ProductionOrder>, _>>()?;

        Ok(orders)
    }

    /// 统计各状态的工单数量
    pub fn count_by_status(&self) -> RepositoryResult<Vec<(OrderStatus, i64)>> {
        let conn = self.get_conn()?;

        let mut stmt =
            conn.prepare("SELECT status, COUNT(*) FROM production_order GROUP BY status")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<(String, i64)>, _>>()?;

        let mut counts = Vec::new();
        for (status_str, count) in rows {
            let status = OrderStatus::from_db_str(&status_str).ok_or_else(|| {
                RepositoryError::DatabaseQueryError(format!("未知工单状态: {}", status_str))
            })?;
            counts.push((status, count));
        }
        Ok(counts)
    }
}

const SELECT_ORDER: &str = r#"SELECT order_id, product_name, quantity, estimated_value,
       status, assigned_to, estimated_completion, hold_reason,
       quality_check_json, created_at, last_transition_at, revision
FROM production_order"#;

/// 质检结果序列化为 JSON 文本
fn quality_check_to_json(
    check: &Option<QualityCheckResult>,
) -> RepositoryResult<Option<String>> {
    match check {
        Some(result) => serde_json::to_string(result)
            .map(Some)
            .map_err(|e| RepositoryError::InternalError(format!("质检结果序列化失败: {}", e))),
        None => Ok(None),
    }
}

/// 映射数据库行到 ProductionOrder
fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ProductionOrder> {
    let status_str: String = row.get(4)?;
    let status = OrderStatus::from_db_str(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("未知工单状态: {}", status_str).into(),
        )
    })?;

    let quality_check = row
        .get::<_, Option<String>>(8)?
        .map(|s| serde_json::from_str::<QualityCheckResult>(&s))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(ProductionOrder {
        order_id: row.get(0)?,
        product_name: row.get(1)?,
        quantity: row.get(2)?,
        estimated_value: row.get(3)?,
        status,
        assigned_to: row.get(5)?,
        estimated_completion: row
            .get::<_, Option<String>>(6)?
            .map(|s| NaiveDateTime::parse_from_str(&s, DATETIME_FMT))
            .transpose()
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    6,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
        hold_reason: row.get(7)?,
        quality_check,
        created_at: parse_datetime(&row.get::<_, String>(9)?, 9)?,
        last_transition_at: parse_datetime(&row.get::<_, String>(10)?, 10)?,
        revision: row.get(11)?,
    })
}

fn parse_datetime(s: &str, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
