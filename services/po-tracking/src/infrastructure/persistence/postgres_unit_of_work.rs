//! PostgreSQL Unit of Work 实现
//!
//! 使用 SQLx Transaction 提供事务协调能力。

use async_trait::async_trait;
use po_adapter_postgres::{TransactionManager, acquire_xact_lock};
use po_errors::{AppError, AppResult};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::tx_repositories::{
    SharedTx, TxBaseRecordRepository, TxNuevoEstatusRepository, TxSupplierOrderRepository,
};
use crate::domain::unit_of_work::{
    BaseRecordWriter, NuevoEstatusWriter, SupplierOrderWriter, UnitOfWork, UnitOfWorkFactory,
};

/// 对账事务的 advisory lock 键（"POTR"）
pub const RECONCILIATION_LOCK_KEY: i64 = 0x504F_5452;

/// PostgreSQL Unit of Work 工厂
pub struct PostgresUnitOfWorkFactory {
    transactions: TransactionManager,
}

impl PostgresUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            transactions: TransactionManager::new(pool),
        }
    }
}

#[async_trait]
impl UnitOfWorkFactory for PostgresUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self.transactions.begin().await?;
        Ok(Box::new(PostgresUnitOfWork::new(Arc::new(Mutex::new(Some(tx))))))
    }
}

/// PostgreSQL Unit of Work 实现
///
/// 所有 Repository 操作都在同一个事务中执行。
pub struct PostgresUnitOfWork {
    tx: SharedTx,
    base_record_repo: TxBaseRecordRepository,
    supplier_order_repo: TxSupplierOrderRepository,
    nuevo_estatus_repo: TxNuevoEstatusRepository,
}

impl PostgresUnitOfWork {
    fn new(tx: SharedTx) -> Self {
        Self {
            base_record_repo: TxBaseRecordRepository::new(tx.clone()),
            supplier_order_repo: TxSupplierOrderRepository::new(tx.clone()),
            nuevo_estatus_repo: TxNuevoEstatusRepository::new(tx.clone()),
            tx,
        }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    fn base_records(&self) -> &dyn BaseRecordWriter {
        &self.base_record_repo
    }

    fn supplier_orders(&self) -> &dyn SupplierOrderWriter {
        &self.supplier_order_repo
    }

    fn nuevo_estatus(&self) -> &dyn NuevoEstatusWriter {
        &self.nuevo_estatus_repo
    }

    async fn lock_reconciliation(&self) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;
        acquire_xact_lock(tx, RECONCILIATION_LOCK_KEY).await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))?;
        TransactionManager::commit(tx).await
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))?;
        TransactionManager::rollback(tx).await
    }
}
