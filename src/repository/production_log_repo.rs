// ==========================================
// 卷料库存系统 - 生产日志数据仓储
// ==========================================
// 红线: 只追加,不修改、不删除
// 对齐: order_summary / production_log 表
// ==========================================

mod queries;

#[cfg(test)]
mod tests;

use crate::domain::production_log::{AuditRecord, LogRow, OrderSummary};
use crate::engine::collaborators::{AuditSink, CollaboratorError};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};
use tracing::debug;

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// ProductionLogRepository - 生产日志仓储
// ==========================================
pub struct ProductionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionLogRepository {
    /// 创建新的生产日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 追加一个订单的审计记录（摘要 + 全部行,单事务）
    ///
    /// # 返回
    /// - Ok(record_id): 本次写入的记录ID
    pub fn append_record(&self, record: &AuditRecord) -> RepositoryResult<String> {
        let record_id = uuid::Uuid::new_v4().to_string();
        let summary = &record.summary;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO order_summary (
                record_id, order_number, client, operator, completed_at,
                line_count, total_pieces, total_footage, box_usage
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record_id,
                summary.order_number,
                summary.client,
                summary.operator,
                summary.timestamp.format(TS_FORMAT).to_string(),
                summary.line_count as i64,
                summary.total_pieces as i64,
                summary.total_footage,
                summary.box_usage,
            ],
        )?;

        for row in &record.rows {
            tx.execute(
                r#"
                INSERT INTO production_log (
                    record_id, logged_at, operator, client, order_number,
                    size, pieces, waste, coils_used, box_usage, line_footage
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
                params![
                    record_id,
                    row.timestamp.format(TS_FORMAT).to_string(),
                    row.operator,
                    row.client,
                    row.order_number,
                    row.size,
                    row.pieces,
                    row.waste,
                    row.coils_used,
                    row.box_usage,
                    row.line_footage,
                ],
            )?;
        }

        tx.commit()?;
        debug!(
            record_id = %record_id,
            order_number = %summary.order_number,
            rows = record.rows.len(),
            "生产日志已追加"
        );
        Ok(record_id)
    }

    pub(super) fn map_log_row(row: &Row<'_>) -> rusqlite::Result<LogRow> {
        Ok(LogRow {
            timestamp: row.get(0)?,
            operator: row.get(1)?,
            client: row.get(2)?,
            order_number: row.get(3)?,
            size: row.get(4)?,
            pieces: row.get(5)?,
            waste: row.get(6)?,
            coils_used: row.get(7)?,
            box_usage: row.get(8)?,
            line_footage: row.get(9)?,
        })
    }

    pub(super) fn map_summary(row: &Row<'_>) -> rusqlite::Result<OrderSummary> {
        Ok(OrderSummary {
            timestamp: row.get(0)?,
            order_number: row.get(1)?,
            client: row.get(2)?,
            operator: row.get(3)?,
            line_count: row.get::<_, i64>(4)? as usize,
            total_pieces: row.get::<_, i64>(5)? as u64,
            total_footage: row.get(6)?,
            box_usage: row.get(7)?,
        })
    }
}

// ==========================================
// AuditSink 实现
// ==========================================
impl AuditSink for ProductionLogRepository {
    fn append(&self, record: &AuditRecord) -> Result<usize, CollaboratorError> {
        self.append_record(record)?;
        Ok(record.rows.len())
    }
}
