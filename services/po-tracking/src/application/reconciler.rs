//! 订单号对账
//!
//! base_datos.OC 由 ordenes_proveedor 推导：规范化 PEDIDO 相同的供应商订单
//! 的 ORDEN_PROVEEDOR。只有显式对账才会刷新 OC。

use metrics::{counter, histogram};
use po_errors::{AppError, AppResult};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::events::{LiveUpdate, NotificationSink};
use crate::domain::pedido::NormalizedPedido;
use crate::domain::supplier_order::SupplierOrderInput;
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

/// 供应商订单写入结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub inserted: u64,
    pub skipped: u64,
    pub reconciled: u64,
}

/// 供应商订单删除结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    pub deleted: u64,
    pub cleared: u64,
    pub reconciled: u64,
}

/// 刷新所有基础记录的 OC，无匹配的记录保持不变
pub async fn reconcile_all(uow: &dyn UnitOfWork) -> AppResult<u64> {
    let updated = uow.base_records().sync_oc().await?;
    debug!(updated, "OC reconciled");
    Ok(updated)
}

/// 清空给定订单号的 OC；空列表不执行任何语句
pub async fn clear_oc_for_pedidos(
    uow: &dyn UnitOfWork,
    pedidos: &[NormalizedPedido],
) -> AppResult<u64> {
    if pedidos.is_empty() {
        return Ok(0);
    }
    uow.base_records().clear_oc(pedidos).await
}

/// 按规范化订单号替换供应商订单，然后对账
pub async fn upsert_supplier_orders(
    uow: &dyn UnitOfWork,
    rows: &[SupplierOrderInput],
) -> AppResult<UpsertSummary> {
    let mut summary = UpsertSummary::default();

    for row in rows {
        let Some(order) = row.validate() else {
            summary.skipped += 1;
            continue;
        };

        uow.supplier_orders().delete_by_pedido(&order.pedido).await?;
        uow.supplier_orders()
            .insert(&order.pedido, &order.orden_proveedor)
            .await?;
        summary.inserted += 1;
    }

    summary.reconciled = reconcile_all(uow).await?;
    Ok(summary)
}

/// 删除供应商订单，清空受影响记录的 OC，然后对账
pub async fn delete_supplier_orders(
    uow: &dyn UnitOfWork,
    ids: &[i32],
) -> AppResult<DeleteSummary> {
    let pedidos = uow.supplier_orders().pedidos_for_ids(ids).await?;
    let deleted = uow.supplier_orders().delete_by_ids(ids).await?;
    let cleared = clear_oc_for_pedidos(uow, &pedidos).await?;
    let reconciled = reconcile_all(uow).await?;

    Ok(DeleteSummary {
        deleted,
        cleared,
        reconciled,
    })
}

/// 提交或回滚，回滚失败只记录日志并保留原始错误
pub(crate) async fn finish<T>(uow: Box<dyn UnitOfWork>, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(e)
        }
    }
}

pub(crate) fn record_outcome<T>(operation: &'static str, started: Instant, result: &AppResult<T>) {
    let outcome = if result.is_ok() { "success" } else { "failure" };
    counter!("po_reconciliations_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
    histogram!("po_reconciliation_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}

/// 对账服务：每个请求一个事务，事务间由 advisory lock 串行化
pub struct PedidoReconciler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    notifier: Arc<dyn NotificationSink>,
}

impl PedidoReconciler {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            uow_factory,
            notifier,
        }
    }

    /// 写入供应商订单
    pub async fn upsert(&self, rows: &[SupplierOrderInput]) -> AppResult<UpsertSummary> {
        if rows.is_empty() {
            return Err(AppError::validation("No se enviaron registros."));
        }

        let started = Instant::now();
        let uow = self.uow_factory.begin().await?;
        let result = async {
            uow.lock_reconciliation().await?;
            upsert_supplier_orders(uow.as_ref(), rows).await
        }
        .await;
        let result = finish(uow, result).await;
        record_outcome("upsert", started, &result);

        let summary = result?;
        info!(
            inserted = summary.inserted,
            skipped = summary.skipped,
            reconciled = summary.reconciled,
            "Supplier orders upserted"
        );
        self.notifier.publish(LiveUpdate::ExcelDataUpdated(None));
        Ok(summary)
    }

    /// 删除供应商订单
    pub async fn delete(&self, ids: &[i32]) -> AppResult<DeleteSummary> {
        if ids.is_empty() {
            return Err(AppError::validation("No se enviaron IDs"));
        }

        let started = Instant::now();
        let uow = self.uow_factory.begin().await?;
        let result = async {
            uow.lock_reconciliation().await?;
            delete_supplier_orders(uow.as_ref(), ids).await
        }
        .await;
        let result = finish(uow, result).await;
        record_outcome("delete", started, &result);

        let summary = result?;
        info!(
            deleted = summary.deleted,
            cleared = summary.cleared,
            "Supplier orders deleted"
        );
        self.notifier.publish(LiveUpdate::ExcelDataUpdated(None));
        Ok(summary)
    }

    /// 手动触发全量对账
    pub async fn sync(&self) -> AppResult<u64> {
        let started = Instant::now();
        let uow = self.uow_factory.begin().await?;
        let result = async {
            uow.lock_reconciliation().await?;
            reconcile_all(uow.as_ref()).await
        }
        .await;
        let result = finish(uow, result).await;
        record_outcome("sync", started, &result);

        let updated = result?;
        info!(updated, "OC synchronized");
        self.notifier.publish(LiveUpdate::ExcelDataUpdated(None));
        Ok(updated)
    }
}
