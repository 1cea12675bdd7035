//! 服务编排器
//!
//! 持有服务名册，并发驱动健康检测并把结果写入共享状态

use crate::config::ServiceDescriptor;
use crate::health::checker::{HealthChecker, ProbeOutcome};
use crate::health::record::HealthRecord;
use crate::status::HealthStore;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info};

/// 服务编排器
pub struct ServiceManager {
    /// 服务名册
    services: Vec<ServiceDescriptor>,
    /// 健康检测器
    checker: Arc<dyn HealthChecker>,
    /// 共享健康状态
    store: HealthStore,
}

impl ServiceManager {
    /// 创建新的服务编排器
    ///
    /// # 参数
    /// * `services` - 服务名册
    /// * `checker` - 健康检测器
    /// * `store` - 共享健康状态
    pub fn new(
        services: Vec<ServiceDescriptor>,
        checker: Arc<dyn HealthChecker>,
        store: HealthStore,
    ) -> Self {
        Self {
            services,
            checker,
            store,
        }
    }

    /// 服务名册
    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    /// 检测单个服务
    ///
    /// # 参数
    /// * `name` - 服务名称
    ///
    /// # 返回
    /// * `Option<HealthRecord>` - 检测结果，服务不在名册中时返回 `None` 且不发出请求
    pub async fn check_service(&self, name: &str) -> Option<HealthRecord> {
        let service = self.services.iter().find(|service| service.name == name)?;
        Some(self.check_and_store(service).await)
    }

    /// 并发检测所有服务，全部探测结束后返回
    pub async fn check_all_services(&self) {
        debug!("开始检测全部服务，服务数量: {}", self.services.len());

        join_all(
            self.services
                .iter()
                .map(|service| self.check_and_store(service)),
        )
        .await;

        debug!("全部服务检测完成");
    }

    /// 取消所有未完成的探测
    pub fn cancel_all(&self) {
        info!("取消所有未完成的健康检测");
        self.checker.cancel_all();
    }

    /// 当前未完成的探测数量
    pub fn in_flight_count(&self) -> usize {
        self.checker.in_flight_count()
    }

    /// 执行探测并写入共享状态，被取消的探测不覆盖已有记录
    async fn check_and_store(&self, service: &ServiceDescriptor) -> HealthRecord {
        match self.checker.check_service(service).await {
            ProbeOutcome::Completed(record) => {
                self.store.update(record.clone());
                record
            }
            ProbeOutcome::Cancelled(record) => {
                debug!("服务 {} 的探测已取消，保留已有状态", service.name);
                record
            }
        }
    }
}
