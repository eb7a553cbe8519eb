// ==========================================
// 卷料库存系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 管理员口令环境变量（config_kv 未配置时使用）
pub const ADMIN_SECRET_ENV: &str = "COIL_INVENTORY_ADMIN_SECRET";

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    // ===== 管理员 =====

    /// 管理员共享口令
    ///
    /// 优先读取 config_kv,其次读取环境变量；均未配置时返回 None（管理操作全部拒绝）
    pub fn admin_secret(&self) -> RepositoryResult<Option<String>> {
        let stored = self
            .get_global_config_value(config_keys::ADMIN_SECRET)?
            .filter(|s| !s.trim().is_empty());
        if stored.is_some() {
            return Ok(stored);
        }
        Ok(std::env::var(ADMIN_SECRET_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty()))
    }

    // ===== 订单默认值 =====

    /// 默认额外英寸（订单草稿初始值）
    ///
    /// 配置缺失或非法（非数字/负数）时返回 0.0
    pub fn default_extra_inch_allowance(&self) -> RepositoryResult<f64> {
        let value = self.get_config_or_default(config_keys::DEFAULT_EXTRA_INCH_ALLOWANCE, "0")?;
        let parsed = value.trim().parse::<f64>().unwrap_or(0.0);
        if parsed.is_finite() && parsed >= 0.0 {
            Ok(parsed)
        } else {
            tracing::warn!(value = %value, "default_extra_inch_allowance 配置非法,使用 0");
            Ok(0.0)
        }
    }

    // ===== 快照 =====

    /// 获取所有 global 配置的快照（JSON格式）
    ///
    /// 管理员口令不进入快照
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key",
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            if key != config_keys::ADMIN_SECRET {
                config_map.insert(key, value);
            }
        }

        serde_json::to_string(&json!(config_map))
            .map_err(|e| RepositoryError::InternalError(e.to_string()))
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> RepositoryResult<usize> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)
            .map_err(|e| RepositoryError::ValidationError(format!("配置快照格式错误: {}", e)))?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            if key == config_keys::ADMIN_SECRET {
                continue;
            }
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3",
                params![GLOBAL_SCOPE, key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 管理员
    pub const ADMIN_SECRET: &str = "admin_secret";

    // 订单默认值
    pub const DEFAULT_EXTRA_INCH_ALLOWANCE: &str = "default_extra_inch_allowance";
}
