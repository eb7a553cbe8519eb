// ==========================================
// 卷料库存系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// - 统一建表（幂等）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
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

/// 初始化 schema（幂等）
///
/// 表:
/// - schema_version: 版本记录
/// - config_kv: 配置（scope_id + key）
/// - coil_inventory: 卷料库存（整表替换）
/// - production_log: 生产行日志（只追加）
/// - order_summary: 订单摘要（只追加）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS coil_inventory (
            coil_id TEXT PRIMARY KEY,
            material TEXT NOT NULL DEFAULT '',
            footage REAL NOT NULL CHECK (footage >= 0),
            location TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT '',
            seq_no INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS order_summary (
            record_id TEXT PRIMARY KEY,
            order_number TEXT NOT NULL,
            client TEXT NOT NULL,
            operator TEXT NOT NULL,
            completed_at TEXT NOT NULL,
            line_count INTEGER NOT NULL,
            total_pieces INTEGER NOT NULL,
            total_footage REAL NOT NULL,
            box_usage TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS production_log (
            log_id INTEGER PRIMARY KEY AUTOINCREMENT,
            record_id TEXT NOT NULL REFERENCES order_summary(record_id),
            logged_at TEXT NOT NULL,
            operator TEXT NOT NULL,
            client TEXT NOT NULL,
            order_number TEXT NOT NULL,
            size TEXT NOT NULL,
            pieces INTEGER NOT NULL,
            waste REAL NOT NULL,
            coils_used TEXT NOT NULL,
            box_usage TEXT NOT NULL,
            line_footage REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_production_log_order
            ON production_log(order_number);
        CREATE INDEX IF NOT EXISTS idx_order_summary_order
            ON order_summary(order_number);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_negative_footage_rejected_by_schema() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO coil_inventory (coil_id, footage) VALUES ('C1', -1.0)",
            [],
        );
        assert!(result.is_err());
    }
}
