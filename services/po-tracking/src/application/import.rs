//! 表格导入
//!
//! 基础数据导入后立即对账；新状态表整表替换。

use metrics::counter;
use po_errors::AppResult;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::reconciler::{finish, reconcile_all, record_outcome};
use crate::domain::base_record::{ImportRow, ImportSummary};
use crate::domain::events::{LiveUpdate, NotificationSink};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

/// 把上传行转换为导入行；非对象行与没有可写列的行记为跳过
fn prepare_rows(
    table: &'static str,
    rows: &[Value],
    columns: &HashSet<String>,
    summary: &mut ImportSummary,
) -> Vec<ImportRow> {
    let mut prepared = Vec::with_capacity(rows.len());
    let mut dropped: HashSet<String> = HashSet::new();

    for row in rows {
        let Some(object) = row.as_object() else {
            summary.record(false);
            continue;
        };
        let result = ImportRow::prepare(object, columns);
        dropped.extend(result.dropped);
        if result.row.is_empty() {
            summary.record(false);
        } else {
            prepared.push(result.row);
        }
    }

    if !dropped.is_empty() {
        let mut dropped: Vec<_> = dropped.into_iter().collect();
        dropped.sort();
        warn!(table, columns = ?dropped, "Ignoring columns not present in table");
    }

    prepared
}

pub(crate) fn record_rows(table: &'static str, summary: &ImportSummary) {
    counter!("po_import_rows_total", "table" => table, "result" => "inserted")
        .increment(summary.inserted);
    counter!("po_import_rows_total", "table" => table, "result" => "skipped")
        .increment(summary.skipped);
}

/// 导入基础数据并对账
pub async fn import_base_records(uow: &dyn UnitOfWork, rows: &[Value]) -> AppResult<ImportSummary> {
    let mut summary = ImportSummary::default();
    let columns = uow.base_records().columns().await?;

    for row in prepare_rows("base_datos", rows, &columns, &mut summary) {
        let inserted = uow.base_records().insert_row(&row).await?;
        summary.record(inserted);
    }

    reconcile_all(uow).await?;
    Ok(summary)
}

/// 清空新状态表并导入
pub async fn replace_nuevo_estatus(
    uow: &dyn UnitOfWork,
    rows: &[Value],
) -> AppResult<ImportSummary> {
    let mut summary = ImportSummary::default();
    let columns = uow.nuevo_estatus().columns().await?;
    uow.nuevo_estatus().delete_all().await?;

    for row in prepare_rows("nuevo_estatus", rows, &columns, &mut summary) {
        let inserted = uow.nuevo_estatus().insert_row(&row).await?;
        summary.record(inserted);
    }

    Ok(summary)
}

/// 基础数据导入服务
pub struct ImportService {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    notifier: Arc<dyn NotificationSink>,
}

impl ImportService {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            uow_factory,
            notifier,
        }
    }

    /// 导入基础数据（单一事务）
    pub async fn import_base_records(&self, rows: &[Value]) -> AppResult<ImportSummary> {
        let started = Instant::now();
        let uow = self.uow_factory.begin().await?;
        let result = async {
            uow.lock_reconciliation().await?;
            import_base_records(uow.as_ref(), rows).await
        }
        .await;
        let result = finish(uow, result).await;
        record_outcome("import", started, &result);

        let summary = result?;
        record_rows("base_datos", &summary);
        info!(
            inserted = summary.inserted,
            skipped = summary.skipped,
            "Base records imported"
        );
        self.notifier.publish(LiveUpdate::ExcelDataUpdated(None));
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::MockNotificationSink;
    use crate::infrastructure::persistence::memory::{FailurePoint, InMemoryTrackingStore};
    use serde_json::json;

    fn service(store: &InMemoryTrackingStore) -> ImportService {
        let mut notifier = MockNotificationSink::new();
        notifier.expect_publish().return_const(());
        ImportService::new(Arc::new(store.clone()), Arc::new(notifier))
    }

    #[tokio::test]
    async fn test_import_normalizes_dates_and_reconciles() {
        let store = InMemoryTrackingStore::new();
        store.seed_supplier_order("100", "SP-1").await;

        let summary = service(&store)
            .import_base_records(&[
                json!({"id": 77, "PEDIDO": "100.0", "FECHA_PEDIDO": 25569}),
                json!({"PEDIDO": "200", "FECHA_COTIZACION": "5/3/2024"}),
            ])
            .await
            .unwrap();

        assert_eq!(summary, ImportSummary { inserted: 2, skipped: 0 });

        let records = store.base_records().await;
        let first = records.iter().find(|r| r["PEDIDO"] == "100.0").unwrap();
        assert_ne!(first["id"], 77);
        assert_eq!(first["OC"], "SP-1");
        assert_eq!(first["FECHA_PEDIDO"], "01/01/1970 00:00:00");
        assert_eq!(first["FECHA_COTIZACION"], "");

        let second = records.iter().find(|r| r["PEDIDO"] == "200").unwrap();
        assert_eq!(second["FECHA_COTIZACION"], "05/03/2024 00:00:00");
        assert_eq!(second["OC"], "");
    }

    #[tokio::test]
    async fn test_import_counts_rejected_rows() {
        let store = InMemoryTrackingStore::new();

        let summary = service(&store)
            .import_base_records(&[
                json!({"PEDIDO": "1"}),
                json!({"PEDIDO": "bad\u{0}value"}),
                json!("not an object"),
            ])
            .await
            .unwrap();

        assert_eq!(summary, ImportSummary { inserted: 1, skipped: 2 });
        assert_eq!(store.base_records().await.len(), 1);
    }

    #[tokio::test]
    async fn test_import_keeps_rows_with_null_oc_or_compaq() {
        let store = InMemoryTrackingStore::new();
        store.seed_supplier_order("1", "SP-1").await;

        let summary = service(&store)
            .import_base_records(&[
                json!({"PEDIDO": "1", "OC": null}),
                json!({"PEDIDO": "2", "COMPAQ": null}),
                json!({"PEDIDO": "3"}),
            ])
            .await
            .unwrap();

        assert_eq!(summary, ImportSummary { inserted: 3, skipped: 0 });

        let records = store.base_records().await;
        let first = records.iter().find(|r| r["PEDIDO"] == "1").unwrap();
        assert_eq!(first["OC"], "SP-1");
        let second = records.iter().find(|r| r["PEDIDO"] == "2").unwrap();
        assert_eq!(second["COMPAQ"], "");
    }

    #[tokio::test]
    async fn test_import_rolls_back_when_reconciliation_fails() {
        let store = InMemoryTrackingStore::new();
        store.fail_at(FailurePoint::SyncOc);

        let result = service(&store)
            .import_base_records(&[json!({"PEDIDO": "1"})])
            .await;

        assert!(result.is_err());
        assert!(store.base_records().await.is_empty());
    }

    #[tokio::test]
    async fn test_replace_nuevo_estatus_inside_unit_of_work() {
        let store = InMemoryTrackingStore::new();
        store.seed_nuevo_estatus(json!({"PEDIDO": "old"})).await;

        let uow = store.begin().await.unwrap();
        let summary = replace_nuevo_estatus(
            uow.as_ref(),
            &[json!({"PEDIDO": "new", "PROMESA_DE_ENTREGA": "1/2/2024 8:30"}), json!({})],
        )
        .await
        .unwrap();
        uow.commit().await.unwrap();

        assert_eq!(summary, ImportSummary { inserted: 2, skipped: 0 });
        let rows = store.nuevo_estatus_rows().await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["PEDIDO"], "new");
        assert_eq!(rows[0]["PROMESA_DE_ENTREGA"], "01/02/2024 08:30:00");
    }
}
