//! 状态查询
//!
//! 共享状态之上的只读视图和汇总统计

use crate::health::{HealthRecord, HealthStatus};
use crate::status::store::{HealthStore, StatusMap};
use serde::{Deserialize, Serialize};

/// 整体状态汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSummary {
    /// 总服务数
    pub total: usize,
    /// 健康服务数
    pub healthy: usize,
    /// 不健康服务数
    pub unhealthy: usize,
    /// 状态未知服务数
    pub unknown: usize,
}

/// 状态查询器，从不修改共享状态
#[derive(Debug, Clone)]
pub struct StatusQuery {
    store: HealthStore,
}

impl StatusQuery {
    /// 创建新的状态查询器
    pub fn new(store: HealthStore) -> Self {
        Self { store }
    }

    /// 获取特定服务状态
    pub fn get_status(&self, name: &str) -> Option<HealthRecord> {
        self.store.get(name)
    }

    /// 获取所有服务状态的副本
    pub fn get_all_statuses(&self) -> StatusMap {
        self.store.snapshot()
    }

    /// 获取健康服务列表
    pub fn get_healthy_services(&self) -> Vec<HealthRecord> {
        self.filter_by_status(HealthStatus::Healthy)
    }

    /// 获取不健康服务列表
    pub fn get_unhealthy_services(&self) -> Vec<HealthRecord> {
        self.filter_by_status(HealthStatus::Unhealthy)
    }

    /// 获取状态未知服务列表
    pub fn get_unknown_services(&self) -> Vec<HealthRecord> {
        self.filter_by_status(HealthStatus::Unknown)
    }

    fn filter_by_status(&self, status: HealthStatus) -> Vec<HealthRecord> {
        self.store.with_records(|records| {
            records
                .iter()
                .filter(|record| record.status == status)
                .cloned()
                .collect()
        })
    }

    /// 是否所有服务都健康，没有服务时为 `true`
    pub fn is_all_healthy(&self) -> bool {
        self.store
            .with_records(|records| records.iter().all(|record| record.status.is_healthy()))
    }

    /// 获取汇总统计
    pub fn get_summary(&self) -> HealthSummary {
        self.store.with_records(|records| {
            records
                .iter()
                .fold(HealthSummary::default(), |mut summary, record| {
                    summary.total += 1;
                    match record.status {
                        HealthStatus::Healthy => summary.healthy += 1,
                        HealthStatus::Unhealthy => summary.unhealthy += 1,
                        HealthStatus::Unknown => summary.unknown += 1,
                    }
                    summary
                })
        })
    }
}
