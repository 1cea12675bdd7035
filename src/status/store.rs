//! 共享健康状态存储
//!
//! 保存每个服务最近一次的健康记录，按名册顺序排列

use crate::config::ServiceDescriptor;
use crate::health::HealthRecord;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// 服务名 -> 健康记录的有序快照
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusMap {
    records: Vec<HealthRecord>,
}

impl StatusMap {
    /// 按服务名查找记录
    pub fn get(&self, name: &str) -> Option<&HealthRecord> {
        self.records.iter().find(|record| record.name == name)
    }

    /// 是否包含指定服务
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 记录数量
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 按名册顺序遍历 `(服务名, 记录)`
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HealthRecord)> {
        self.records
            .iter()
            .map(|record| (record.name.as_str(), record))
    }

    /// 按名册顺序遍历记录
    pub fn values(&self) -> impl Iterator<Item = &HealthRecord> {
        self.records.iter()
    }
}

impl IntoIterator for StatusMap {
    type Item = HealthRecord;
    type IntoIter = std::vec::IntoIter<HealthRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl Serialize for StatusMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(&record.name, record)?;
        }
        map.end()
    }
}

/// 共享健康状态
///
/// 克隆得到的是同一份状态的句柄。锁只在同步代码中短暂持有，
/// 不会跨越 `.await`。
#[derive(Debug, Clone, Default)]
pub struct HealthStore {
    records: Arc<RwLock<Vec<HealthRecord>>>,
}

impl HealthStore {
    /// 为名册中的每个服务创建 `Unknown` 记录
    pub fn from_services(services: &[ServiceDescriptor]) -> Self {
        let records = services
            .iter()
            .map(|service| HealthRecord::unknown(service.name.clone(), service.url.clone()))
            .collect();

        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<HealthRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<HealthRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// 用新记录替换同名服务的记录
    ///
    /// # 返回
    /// * `bool` - 名册中不存在该服务时返回 `false`，记录被忽略
    pub fn update(&self, record: HealthRecord) -> bool {
        let mut records = self.write();
        match records.iter_mut().find(|existing| existing.name == record.name) {
            Some(existing) => {
                *existing = record;
                true
            }
            None => false,
        }
    }

    /// 获取指定服务的记录副本
    pub fn get(&self, name: &str) -> Option<HealthRecord> {
        self.read().iter().find(|record| record.name == name).cloned()
    }

    /// 获取全部记录的副本
    pub fn snapshot(&self) -> StatusMap {
        StatusMap {
            records: self.read().clone(),
        }
    }

    /// 在读锁下访问记录
    pub fn with_records<R>(&self, f: impl FnOnce(&[HealthRecord]) -> R) -> R {
        f(&self.read())
    }

    /// 记录数量
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
