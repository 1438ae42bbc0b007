//! 持久化实现

#[cfg(any(test, feature = "test-support"))]
pub mod memory;
mod postgres_base_record_repository;
mod postgres_localidad_repository;
mod postgres_nuevo_estatus_repository;
mod postgres_supplier_order_repository;
mod postgres_unit_of_work;
mod postgres_user_repository;
pub mod schema;
mod sql;
mod tx_repositories;

pub use postgres_base_record_repository::PostgresBaseRecordRepository;
pub use postgres_localidad_repository::PostgresLocalidadRepository;
pub use postgres_nuevo_estatus_repository::PostgresNuevoEstatusRepository;
pub use postgres_supplier_order_repository::PostgresSupplierOrderRepository;
pub use postgres_unit_of_work::{
    PostgresUnitOfWork, PostgresUnitOfWorkFactory, RECONCILIATION_LOCK_KEY,
};
pub use postgres_user_repository::PostgresUserRepository;
pub use sql::normalized_pedido_sql;
