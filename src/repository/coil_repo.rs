// ==========================================
// 卷料库存系统 - 卷料库存数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑,只做数据映射
// 语义: 整表加载 / 整表替换（非增量补丁）
// ==========================================
// 并发: 读-改-写（update_all）在同一连接守卫与 IMMEDIATE 事务内完成,
//       同进程及同库文件的多进程写者均串行化
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::coil::Coil;
use crate::engine::collaborators::{CollaboratorError, InventorySource};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};
use tracing::debug;

// ==========================================
// CoilRepository - 卷料库存仓储
// ==========================================
pub struct CoilRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CoilRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 打开数据库文件创建仓储实例
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Coil> {
        Ok(Coil {
            coil_id: row.get(0)?,
            material: row.get(1)?,
            footage: row.get(2)?,
            location: row.get(3)?,
            status: row.get(4)?,
        })
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 加载完整卷料表（按写入顺序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Coil>> {
        let conn = self.get_conn()?;
        Self::select_all(&conn)
    }

    /// 按卷料号查询
    pub fn find_by_id(&self, coil_id: &str) -> RepositoryResult<Option<Coil>> {
        let conn = self.get_conn()?;
        let coil = conn
            .query_row(
                r#"
                SELECT coil_id, material, footage, location, status
                FROM coil_inventory
                WHERE coil_id = ?1
                "#,
                params![coil_id],
                Self::map_row,
            )
            .optional()?;
        Ok(coil)
    }

    /// 卷料数量
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM coil_inventory", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 整表替换
    ///
    /// 在单个事务内清空并写入全部卷料；任一行失败则整体回滚
    pub fn replace_all(&self, coils: &[Coil]) -> RepositoryResult<usize> {
        Self::check_footage(coils)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        Self::write_all(&tx, coils)?;
        tx.commit()?;

        debug!(rows = coils.len(), "卷料库存整表替换完成");
        Ok(coils.len())
    }

    /// 读-改-写
    ///
    /// 持有连接守卫并开启 IMMEDIATE 事务,加载整表交给 apply,
    /// 再以其返回值整表替换。apply 返回 None 时回滚,不做任何写入。
    ///
    /// # 返回
    /// - Ok(true): 已提交
    /// - Ok(false): apply 放弃写入
    pub fn update_all<F>(&self, apply: F) -> RepositoryResult<bool>
    where
        F: FnOnce(Vec<Coil>) -> Option<Vec<Coil>>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = Self::select_all(&tx)?;
        let Some(next) = apply(current) else {
            return Ok(false);
        };
        Self::check_footage(&next)?;
        Self::write_all(&tx, &next)?;
        tx.commit()?;

        debug!(rows = next.len(), "卷料库存读-改-写提交完成");
        Ok(true)
    }

    // ==========================================
    // 内部方法
    // ==========================================

    fn select_all(conn: &Connection) -> RepositoryResult<Vec<Coil>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT coil_id, material, footage, location, status
            FROM coil_inventory
            ORDER BY seq_no, coil_id
            "#,
        )?;

        let coils = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(coils)
    }

    fn check_footage(coils: &[Coil]) -> RepositoryResult<()> {
        match coils.iter().find(|c| !c.has_valid_footage()) {
            Some(bad) => Err(RepositoryError::FieldValueError {
                field: "footage".to_string(),
                message: format!("coil={} footage={}", bad.coil_id, bad.footage),
            }),
            None => Ok(()),
        }
    }

    fn write_all(conn: &Connection, coils: &[Coil]) -> RepositoryResult<()> {
        conn.execute("DELETE FROM coil_inventory", [])?;
        for (seq_no, coil) in coils.iter().enumerate() {
            conn.execute(
                r#"
                INSERT INTO coil_inventory (coil_id, material, footage, location, status, seq_no)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    coil.coil_id,
                    coil.material,
                    coil.footage,
                    coil.location,
                    coil.status,
                    seq_no as i64,
                ],
            )?;
        }
        Ok(())
    }
}

// ==========================================
// InventorySource 实现
// ==========================================
impl InventorySource for CoilRepository {
    fn update(
        &self,
        apply: &mut dyn FnMut(Vec<Coil>) -> Option<Vec<Coil>>,
    ) -> Result<bool, CollaboratorError> {
        Ok(self.update_all(apply)?)
    }
}
