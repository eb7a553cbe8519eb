use super::ProductionLogRepository;
use crate::domain::production_log::{LogRow, OrderSummary};
use crate::repository::error::RepositoryResult;
use rusqlite::params;

const LOG_COLUMNS: &str = r#"
    logged_at, operator, client, order_number, size,
    pieces, waste, coils_used, box_usage, line_footage
"#;

const SUMMARY_COLUMNS: &str = r#"
    completed_at, order_number, client, operator,
    line_count, total_pieces, total_footage, box_usage
"#;

impl ProductionLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按订单号查询日志行（按写入顺序）
    pub fn find_by_order_number(&self, order_number: &str) -> RepositoryResult<Vec<LogRow>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM production_log WHERE order_number = ?1 ORDER BY log_id",
            LOG_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![order_number], Self::map_log_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 查询最近的日志行（最新在前）
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<LogRow>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM production_log ORDER BY log_id DESC LIMIT ?1",
            LOG_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit as i64], Self::map_log_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 全部日志行（按写入顺序）
    pub fn list_all(&self) -> RepositoryResult<Vec<LogRow>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM production_log ORDER BY log_id", LOG_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], Self::map_log_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 按订单号查询订单摘要（同一订单号可能多次完成）
    pub fn find_summaries_by_order(&self, order_number: &str) -> RepositoryResult<Vec<OrderSummary>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM order_summary WHERE order_number = ?1 ORDER BY completed_at, rowid",
            SUMMARY_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![order_number], Self::map_summary)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 日志行总数
    pub fn count_rows(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM production_log", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
