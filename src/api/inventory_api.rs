// ==========================================
// 卷料库存系统 - 库存 API
// ==========================================
// 职责: 库存查询 + 管理员覆写（设置英尺数/库位、删除、入库、文件导入）
// 红线: 管理员操作必须通过共享口令校验
// 红线: 覆写与引擎共用 CoilStore 变更原语,footage 不得为负
// ==========================================

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::coil::Coil;
use crate::engine::coil_store::CoilStore;
use crate::importer::error::ImportError;
use crate::importer::{CoilImporter, ImportMode};
use crate::repository::coil_repo::CoilRepository;

/// 导入结果摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub mode: ImportMode,
    pub imported: usize,
    pub total: usize,
}

// ==========================================
// InventoryApi - 库存 API
// ==========================================
pub struct InventoryApi {
    coil_repo: Arc<CoilRepository>,
    config: Arc<ConfigManager>,
    importer: CoilImporter,
}

impl InventoryApi {
    pub fn new(coil_repo: Arc<CoilRepository>, config: Arc<ConfigManager>) -> Self {
        Self {
            coil_repo,
            config,
            importer: CoilImporter::default(),
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询完整卷料表
    pub fn list_coils(&self) -> ApiResult<Vec<Coil>> {
        Ok(self.coil_repo.list_all()?)
    }

    /// 按卷料号查询
    pub fn get_coil(&self, coil_id: &str) -> ApiResult<Coil> {
        if coil_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("卷料号不能为空".to_string()));
        }
        self.coil_repo
            .find_by_id(coil_id.trim())?
            .ok_or_else(|| ApiError::NotFound(format!("卷料(id={})不存在", coil_id.trim())))
    }

    /// 库存英尺数合计
    pub fn total_footage(&self) -> ApiResult<f64> {
        Ok(CoilStore::new(self.coil_repo.list_all()?).total_footage())
    }

    // ==========================================
    // 管理员覆写
    // ==========================================

    /// 设置卷料剩余英尺数
    pub fn set_footage(&self, secret: &str, coil_id: &str, footage: f64) -> ApiResult<Coil> {
        let coil = self.mutate(secret, |store| {
            store.set_footage(coil_id, footage)?;
            changed(store, coil_id)
        })?;
        info!(coil_id = %coil.coil_id, footage = coil.footage, "管理员设置英尺数");
        Ok(coil)
    }

    /// 设置卷料库位
    pub fn set_location(&self, secret: &str, coil_id: &str, location: &str) -> ApiResult<Coil> {
        let coil = self.mutate(secret, |store| {
            store.set_location(coil_id, location)?;
            changed(store, coil_id)
        })?;
        info!(coil_id = %coil.coil_id, location = %coil.location, "管理员设置库位");
        Ok(coil)
    }

    /// 删除卷料
    pub fn remove_coil(&self, secret: &str, coil_id: &str) -> ApiResult<Coil> {
        let removed = self.mutate(secret, |store| Ok(store.remove(coil_id)?))?;
        info!(coil_id = %removed.coil_id, footage = removed.footage, "管理员删除卷料");
        Ok(removed)
    }

    /// 入库新卷料
    pub fn receive_coil(&self, secret: &str, coil: Coil) -> ApiResult<Coil> {
        if coil.coil_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("卷料号不能为空".to_string()));
        }
        let coil_id = coil.coil_id.clone();
        let coil = self.mutate(secret, move |store| {
            store.insert(coil)?;
            changed(store, &coil_id)
        })?;
        info!(coil_id = %coil.coil_id, footage = coil.footage, "管理员入库卷料");
        Ok(coil)
    }

    /// 从 CSV/Excel 文件导入卷料表
    ///
    /// 文件整体校验通过后才写库；任一行错误时库存保持不变
    pub fn import_coils(
        &self,
        secret: &str,
        file_path: &Path,
        mode: ImportMode,
    ) -> ApiResult<ImportSummary> {
        self.verify_admin(secret)?;

        let imported = self.importer.read_file(file_path)?;
        let imported_count = imported.len();

        let mut outcome = None;
        self.coil_repo.update_all(|existing| {
            match CoilImporter::merge(mode, existing, imported) {
                Ok(merged) => {
                    outcome = Some(Ok(merged.len()));
                    Some(merged)
                }
                Err(e) => {
                    outcome = Some(Err(e));
                    None
                }
            }
        })?;
        let total = outcome.unwrap_or_else(|| {
            Err(ImportError::InternalError("卷料表合并未执行".to_string()))
        })?;

        info!(
            file = %file_path.display(),
            mode = ?mode,
            imported = imported_count,
            total,
            "卷料表导入完成"
        );
        Ok(ImportSummary {
            mode,
            imported: imported_count,
            total,
        })
    }

    // ==========================================
    // 内部方法
    // ==========================================

    /// 校验管理员口令
    fn verify_admin(&self, secret: &str) -> ApiResult<()> {
        let expected = self.config.admin_secret()?.ok_or_else(|| {
            warn!("管理员口令未配置,拒绝管理操作");
            ApiError::Unauthorized("管理员口令未配置".to_string())
        })?;

        if !secrets_match(secret.as_bytes(), expected.as_bytes()) {
            warn!("管理员口令校验失败");
            return Err(ApiError::Unauthorized("管理员口令错误".to_string()));
        }
        Ok(())
    }

    /// 口令校验后在仓储读-改-写区间内变更库存
    ///
    /// op 失败时放弃写入,库存保持不变
    fn mutate<T, F>(&self, secret: &str, op: F) -> ApiResult<T>
    where
        F: FnOnce(&mut CoilStore) -> ApiResult<T>,
    {
        self.verify_admin(secret)?;

        let mut outcome = None;
        self.coil_repo.update_all(|coils| {
            let mut store = CoilStore::new(coils);
            match op(&mut store) {
                Ok(value) => {
                    outcome = Some(Ok(value));
                    Some(store.into_coils())
                }
                Err(e) => {
                    outcome = Some(Err(e));
                    None
                }
            }
        })?;
        outcome.unwrap_or_else(|| Err(ApiError::InternalError("库存变更未执行".to_string())))
    }
}

/// 变更后的卷料
fn changed(store: &CoilStore, coil_id: &str) -> ApiResult<Coil> {
    store
        .get(coil_id)
        .cloned()
        .ok_or_else(|| ApiError::InternalError(format!("变更后卷料缺失: {}", coil_id)))
}

// 长度不同直接失败；长度相同时逐字节比较全部内容
fn secrets_match(given: &[u8], expected: &[u8]) -> bool {
    if given.len() != expected.len() {
        return false;
    }
    given
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_keys;
    use rusqlite::Connection;
    use std::sync::Mutex;

    const SECRET: &str = "letmein";

    fn setup(coils: &[Coil]) -> InventoryApi {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        let repo = Arc::new(CoilRepository::new(conn.clone()));
        repo.replace_all(coils).unwrap();
        let config = Arc::new(ConfigManager::from_connection(conn));
        config
            .set_global_config_value(config_keys::ADMIN_SECRET, SECRET)
            .unwrap();
        InventoryApi::new(repo, config)
    }

    fn stock() -> Vec<Coil> {
        vec![
            Coil::new("C1", "Steel", 100.0, "A-1"),
            Coil::new("C2", "Steel", 40.0, "B-2"),
        ]
    }

    #[test]
    fn test_queries() {
        let api = setup(&stock());
        assert_eq!(api.list_coils().unwrap().len(), 2);
        assert_eq!(api.get_coil(" C2 ").unwrap().footage, 40.0);
        assert!(matches!(api.get_coil("C9"), Err(ApiError::NotFound(_))));
        assert!(matches!(api.get_coil(""), Err(ApiError::InvalidInput(_))));
        assert_eq!(api.total_footage().unwrap(), 140.0);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let api = setup(&stock());
        let result = api.set_footage("nope", "C1", 5.0);
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
        assert_eq!(api.get_coil("C1").unwrap().footage, 100.0);
    }

    #[test]
    fn test_set_footage_and_location() {
        let api = setup(&stock());

        let coil = api.set_footage(SECRET, "C1", 75.5).unwrap();
        assert_eq!(coil.footage, 75.5);
        let coil = api.set_location(SECRET, "C1", " Z-9 ").unwrap();
        assert_eq!(coil.location, "Z-9");

        let stored = api.get_coil("C1").unwrap();
        assert_eq!(stored.footage, 75.5);
        assert_eq!(stored.location, "Z-9");
    }

    #[test]
    fn test_negative_footage_rejected() {
        let api = setup(&stock());
        let result = api.set_footage(SECRET, "C1", -1.0);
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
        assert_eq!(api.get_coil("C1").unwrap().footage, 100.0);
    }

    #[test]
    fn test_receive_and_remove() {
        let api = setup(&stock());

        api.receive_coil(SECRET, Coil::new("C3", "Alu", 60.0, "C-3"))
            .unwrap();
        assert!(matches!(
            api.receive_coil(SECRET, Coil::new("C3", "Alu", 1.0, "C-3")),
            Err(ApiError::BusinessRuleViolation(_))
        ));

        let removed = api.remove_coil(SECRET, "C2").unwrap();
        assert_eq!(removed.coil_id, "C2");

        let ids: Vec<String> = api
            .list_coils()
            .unwrap()
            .into_iter()
            .map(|c| c.coil_id)
            .collect();
        assert_eq!(ids, vec!["C1", "C3"]);
    }

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match(b"abc", b"abc"));
        assert!(!secrets_match(b"abc", b"abd"));
        assert!(!secrets_match(b"abc", b"abcd"));
    }
}
