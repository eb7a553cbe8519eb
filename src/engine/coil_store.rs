// ==========================================
// 卷料库存系统 - 卷料存储（内存）
// ==========================================
// 职责: 单个订单处理期间由引擎独占的库存行
// 红线: 任何写操作先校验前置条件,失败时不产生任何修改
// 红线: footage 永不为负
// ==========================================

use crate::domain::coil::Coil;
use crate::engine::error::StoreError;
use tracing::warn;

/// 卷料存储快照（用于整单回滚）
#[derive(Debug, Clone, PartialEq)]
pub struct CoilSnapshot(Vec<Coil>);

// ==========================================
// CoilStore - 卷料存储
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoilStore {
    coils: Vec<Coil>,
    repairs: Vec<String>,
}

impl CoilStore {
    /// 从库存表构建
    ///
    /// 同号卷料只保留第一条；负数/非有限英尺数按 0 处理,
    /// 以保证存储内的不变量从加载时起即成立。
    pub fn new(coils: Vec<Coil>) -> Self {
        let mut store = Self::default();
        for mut coil in coils {
            if store.position(&coil.coil_id).is_some() {
                warn!(coil_id = %coil.coil_id, "忽略重复卷料");
                store.repairs.push(format!("重复卷料已忽略: {}", coil.coil_id));
                continue;
            }
            if !coil.has_valid_footage() {
                warn!(coil_id = %coil.coil_id, footage = coil.footage, "非法英尺数按 0 处理");
                store
                    .repairs
                    .push(format!("卷料 {} 英尺数 {} 按 0 处理", coil.coil_id, coil.footage));
                coil.footage = 0.0;
            }
            store.coils.push(coil);
        }
        store
    }

    fn position(&self, coil_id: &str) -> Option<usize> {
        self.coils.iter().position(|c| c.coil_id == coil_id)
    }

    fn get_mut(&mut self, coil_id: &str) -> Result<&mut Coil, StoreError> {
        self.coils
            .iter_mut()
            .find(|c| c.coil_id == coil_id)
            .ok_or_else(|| StoreError::UnknownCoil(coil_id.to_string()))
    }

    // ==========================================
    // 读操作
    // ==========================================

    /// 卷料剩余英尺数
    pub fn footage(&self, coil_id: &str) -> Result<f64, StoreError> {
        self.get(coil_id)
            .map(|c| c.footage)
            .ok_or_else(|| StoreError::UnknownCoil(coil_id.to_string()))
    }

    pub fn get(&self, coil_id: &str) -> Option<&Coil> {
        self.coils.iter().find(|c| c.coil_id == coil_id)
    }

    pub fn contains(&self, coil_id: &str) -> bool {
        self.position(coil_id).is_some()
    }

    /// 全部卷料（按加载顺序）
    pub fn coils(&self) -> &[Coil] {
        &self.coils
    }

    /// 加载时修正的异常行
    pub fn repairs(&self) -> &[String] {
        &self.repairs
    }

    pub fn into_coils(self) -> Vec<Coil> {
        self.coils
    }

    pub fn len(&self) -> usize {
        self.coils.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coils.is_empty()
    }

    /// 库存总英尺数
    pub fn total_footage(&self) -> f64 {
        self.coils.iter().map(|c| c.footage).sum()
    }

    // ==========================================
    // 扣料
    // ==========================================

    /// 从卷料扣减英尺数
    ///
    /// # 前置条件
    /// - amount 有限且 >= 0
    /// - amount <= 当前剩余英尺数
    ///
    /// 前置条件不满足时返回错误,存储保持不变
    pub fn debit(&mut self, coil_id: &str, amount: f64) -> Result<f64, StoreError> {
        let coil = self.get_mut(coil_id)?;

        if !amount.is_finite() || amount < 0.0 {
            return Err(StoreError::InvalidAmount {
                coil_id: coil_id.to_string(),
                value: amount,
            });
        }
        if amount > coil.footage {
            return Err(StoreError::InsufficientFootage {
                coil_id: coil_id.to_string(),
                requested: amount,
                available: coil.footage,
            });
        }

        // amount <= footage 时 IEEE 减法结果不会为负
        coil.footage -= amount;
        Ok(coil.footage)
    }

    // ==========================================
    // 快照与回滚
    // ==========================================

    pub fn snapshot(&self) -> CoilSnapshot {
        CoilSnapshot(self.coils.clone())
    }

    pub fn restore(&mut self, snapshot: CoilSnapshot) {
        self.coils = snapshot.0;
    }

    // ==========================================
    // 管理员覆写原语
    // ==========================================

    /// 新增卷料（入库）
    pub fn insert(&mut self, coil: Coil) -> Result<(), StoreError> {
        if self.contains(&coil.coil_id) {
            return Err(StoreError::DuplicateCoil(coil.coil_id));
        }
        if !coil.has_valid_footage() {
            return Err(StoreError::InvalidAmount {
                coil_id: coil.coil_id,
                value: coil.footage,
            });
        }
        self.coils.push(coil);
        Ok(())
    }

    /// 直接设置剩余英尺数
    pub fn set_footage(&mut self, coil_id: &str, footage: f64) -> Result<(), StoreError> {
        if !footage.is_finite() || footage < 0.0 {
            // 先确认卷料存在,未知卷料优先报告
            self.get_mut(coil_id)?;
            return Err(StoreError::InvalidAmount {
                coil_id: coil_id.to_string(),
                value: footage,
            });
        }
        self.get_mut(coil_id)?.footage = footage;
        Ok(())
    }

    /// 设置库位
    pub fn set_location(&mut self, coil_id: &str, location: &str) -> Result<(), StoreError> {
        self.get_mut(coil_id)?.location = location.trim().to_string();
        Ok(())
    }

    /// 删除卷料
    pub fn remove(&mut self, coil_id: &str) -> Result<Coil, StoreError> {
        let idx = self
            .position(coil_id)
            .ok_or_else(|| StoreError::UnknownCoil(coil_id.to_string()))?;
        Ok(self.coils.remove(idx))
    }
}
