//! PO Tracking Service - 采购订单跟踪服务入口
//!
//! 负责基础数据导入、供应商订单对账与实时推送

use std::sync::Arc;
use std::time::Duration;

use po_adapter_postgres::{MigrationManager, PostgresConfig, SslMode, create_pool};
use po_bootstrap::{init_runtime, shutdown_signal, spawn_pool_metrics_collector};
use po_config::AppConfig;
use po_errors::AppError;
use po_telemetry::init_metrics;
use secrecy::ExposeSecret;
use tracing::{info, warn};

use po_tracking::api::{self, AppState, Backends};
use po_tracking::infrastructure::events::BroadcastNotifier;
use po_tracking::infrastructure::last_update::FileLastUpdateRepository;
use po_tracking::infrastructure::persistence::schema;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load("config")?;
    init_runtime(&config);

    // 指标导出
    let metrics = if config.telemetry.metrics_enabled {
        Some(init_metrics()?)
    } else {
        None
    };

    // 数据库连接池
    let ssl_mode: SslMode = config.database.ssl_mode.parse()?;
    let pg_config = PostgresConfig::new(config.database.url.expose_secret().clone())
        .with_max_connections(config.database.max_connections)
        .with_ssl_mode(ssl_mode);
    let pool = create_pool(&pg_config).await?;

    if config.database.run_migrations {
        let result = MigrationManager::new(pool.clone())
            .migrate(&schema::migrations())
            .await?;
        if !result.is_success() {
            for failed in &result.errors {
                warn!(version = failed.version, name = %failed.name, error = %failed.error, "Migration failed");
            }
            return Err(AppError::internal("Database migrations failed").into());
        }
        info!(
            applied = result.applied_count(),
            skipped = result.skipped.len(),
            "Migrations complete"
        );
    }

    spawn_pool_metrics_collector("po_tracking", pool.clone(), Duration::from_secs(15));

    let last_update = Arc::new(FileLastUpdateRepository::load(&config.storage.last_update_file).await);
    let notifier = BroadcastNotifier::default();
    let state = AppState::new(Backends::postgres(pool, last_update), notifier, metrics);
    let app = api::app(state, &config);

    let addr = config.bind_address();
    info!(%addr, "Starting po-tracking");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
