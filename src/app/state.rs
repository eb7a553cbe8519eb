// ==========================================
// 卷料库存系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 连接: 全部仓储共享同一 SQLite 连接
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{InventoryApi, OrderApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::engine::collaborators::{LoggingNotificationSink, NotificationSink};
use crate::repository::{coil_repo::CoilRepository, production_log_repo::ProductionLogRepository};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "COIL_INVENTORY_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 库存API
    pub inventory_api: Arc<InventoryApi>,

    /// 订单API
    pub order_api: Arc<OrderApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    pub coil_repo: Arc<CoilRepository>,

    pub production_log_repo: Arc<ProductionLogRepository>,
}

impl AppState {
    /// 使用默认通知（写日志）创建应用状态
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_notifier(db_path, Arc::new(LoggingNotificationSink))
    }

    /// 使用指定通知创建应用状态
    pub fn with_notifier(
        db_path: String,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState,数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        match read_schema_version(&conn) {
            Ok(Some(version)) if version == CURRENT_SCHEMA_VERSION => {}
            Ok(version) => tracing::warn!(
                ?version,
                expected = CURRENT_SCHEMA_VERSION,
                "schema_version 与当前代码不一致"
            ),
            Err(e) => tracing::warn!("schema_version 读取失败(将继续启动): {}", e),
        }
        let conn = Arc::new(Mutex::new(conn));

        let coil_repo = Arc::new(CoilRepository::new(conn.clone()));
        let production_log_repo = Arc::new(ProductionLogRepository::new(conn.clone()));
        let config_manager = Arc::new(ConfigManager::from_connection(conn));

        let inventory_api = Arc::new(InventoryApi::new(
            coil_repo.clone(),
            config_manager.clone(),
        ));
        let order_api = Arc::new(OrderApi::new(
            coil_repo.clone(),
            production_log_repo.clone(),
            config_manager.clone(),
            notifier,
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            inventory_api,
            order_api,
            config_manager,
            coil_repo,
            production_log_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先读取 COIL_INVENTORY_DB_PATH,其次为用户数据目录下的 coil-inventory/coil_inventory.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./coil_inventory.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("coil-inventory");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("coil_inventory.db");
        }
    }

    path.to_string_lossy().to_string()
}
