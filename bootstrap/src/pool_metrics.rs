//! Metrics 模块
//!
//! 连接池状态周期性写入 gauge

use metrics::gauge;
use sqlx::PgPool;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// 设置连接池大小
pub fn set_pool_size(pool_name: &str, size: u32) {
    let labels = [("pool", pool_name.to_string())];
    gauge!("connection_pool_size", &labels).set(size as f64);
}

/// 设置空闲连接数
pub fn set_idle_connections(pool_name: &str, count: usize) {
    let labels = [("pool", pool_name.to_string())];
    gauge!("connection_pool_idle", &labels).set(count as f64);
}

/// 启动后台任务，按固定间隔采集连接池状态
pub fn spawn_pool_metrics_collector(
    pool_name: &'static str,
    pool: PgPool,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if pool.is_closed() {
                debug!(pool = pool_name, "Pool closed, stopping metrics collector");
                break;
            }
            set_pool_size(pool_name, pool.size());
            set_idle_connections(pool_name, pool.num_idle());
        }
    })
}
