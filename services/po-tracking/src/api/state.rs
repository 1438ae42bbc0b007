//! 应用状态与依赖装配

use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;

use crate::application::{
    ImportService, LocalidadService, NuevoEstatusService, PedidoReconciler, RecordService,
    UserService,
};
use crate::domain::events::NotificationSink;
use crate::domain::repositories::{
    BaseRecordRepository, LastUpdateRepository, LocalidadRepository, NuevoEstatusRepository,
    SupplierOrderRepository, UserRepository,
};
use crate::domain::unit_of_work::UnitOfWorkFactory;
use crate::infrastructure::events::BroadcastNotifier;
use crate::infrastructure::health::{HealthProbe, PostgresHealthProbe};
#[cfg(any(test, feature = "test-support"))]
use crate::infrastructure::health::StaticHealthProbe;
#[cfg(any(test, feature = "test-support"))]
use crate::infrastructure::persistence::memory::{InMemoryLastUpdate, InMemoryTrackingStore};
use crate::infrastructure::persistence::{
    PostgresBaseRecordRepository, PostgresLocalidadRepository, PostgresNuevoEstatusRepository,
    PostgresSupplierOrderRepository, PostgresUnitOfWorkFactory, PostgresUserRepository,
};

/// 存储后端
pub struct Backends {
    pub uow_factory: Arc<dyn UnitOfWorkFactory>,
    pub base_records: Arc<dyn BaseRecordRepository>,
    pub supplier_orders: Arc<dyn SupplierOrderRepository>,
    pub nuevo_estatus: Arc<dyn NuevoEstatusRepository>,
    pub users: Arc<dyn UserRepository>,
    pub localidades: Arc<dyn LocalidadRepository>,
    pub last_update: Arc<dyn LastUpdateRepository>,
    pub health: Arc<dyn HealthProbe>,
}

impl Backends {
    pub fn postgres(pool: PgPool, last_update: Arc<dyn LastUpdateRepository>) -> Self {
        Self {
            uow_factory: Arc::new(PostgresUnitOfWorkFactory::new(pool.clone())),
            base_records: Arc::new(PostgresBaseRecordRepository::new(pool.clone())),
            supplier_orders: Arc::new(PostgresSupplierOrderRepository::new(pool.clone())),
            nuevo_estatus: Arc::new(PostgresNuevoEstatusRepository::new(pool.clone())),
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            localidades: Arc::new(PostgresLocalidadRepository::new(pool.clone())),
            last_update,
            health: Arc::new(PostgresHealthProbe::new(pool)),
        }
    }

    /// 全部由同一个内存存储提供
    #[cfg(any(test, feature = "test-support"))]
    pub fn in_memory(store: &InMemoryTrackingStore) -> Self {
        let store = Arc::new(store.clone());
        Self {
            uow_factory: store.clone(),
            base_records: store.clone(),
            supplier_orders: store.clone(),
            nuevo_estatus: store.clone(),
            users: store.clone(),
            localidades: store,
            last_update: Arc::new(InMemoryLastUpdate::default()),
            health: Arc::new(StaticHealthProbe),
        }
    }
}

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<RecordService>,
    pub imports: Arc<ImportService>,
    pub reconciler: Arc<PedidoReconciler>,
    pub supplier_orders: Arc<dyn SupplierOrderRepository>,
    pub nuevo_estatus: Arc<NuevoEstatusService>,
    pub users: Arc<UserService>,
    pub localidades: Arc<LocalidadService>,
    pub notifier: BroadcastNotifier,
    pub health: Arc<dyn HealthProbe>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        backends: Backends,
        notifier: BroadcastNotifier,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let sink: Arc<dyn NotificationSink> = Arc::new(notifier.clone());

        Self {
            records: Arc::new(RecordService::new(backends.base_records, sink.clone())),
            imports: Arc::new(ImportService::new(
                backends.uow_factory.clone(),
                sink.clone(),
            )),
            reconciler: Arc::new(PedidoReconciler::new(
                backends.uow_factory.clone(),
                sink.clone(),
            )),
            supplier_orders: backends.supplier_orders,
            nuevo_estatus: Arc::new(NuevoEstatusService::new(
                backends.uow_factory,
                backends.nuevo_estatus,
                backends.last_update,
                sink,
            )),
            users: Arc::new(UserService::new(backends.users)),
            localidades: Arc::new(LocalidadService::new(backends.localidades)),
            notifier,
            health: backends.health,
            metrics,
        }
    }
}
