//! 就绪检查

use async_trait::async_trait;
use po_adapter_postgres::check_connection;
use po_telemetry::HealthStatus;
use sqlx::PgPool;

/// 依赖健康探针
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn check(&self) -> HealthStatus;
}

pub struct PostgresHealthProbe {
    pool: PgPool,
}

impl PostgresHealthProbe {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthProbe for PostgresHealthProbe {
    async fn check(&self) -> HealthStatus {
        let mut status = HealthStatus::new();
        match check_connection(&self.pool).await {
            Ok(()) => status.add_check("postgres", true, None),
            Err(e) => status.add_check("postgres", false, Some(e.to_string())),
        }
        status
    }
}

/// 无外部依赖时始终健康
#[cfg(any(test, feature = "test-support"))]
pub struct StaticHealthProbe;

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl HealthProbe for StaticHealthProbe {
    async fn check(&self) -> HealthStatus {
        let mut status = HealthStatus::new();
        status.add_check("memory", true, None);
        status
    }
}
