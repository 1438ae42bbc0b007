//! 新状态表（nuevo_estatus）

use chrono::{SecondsFormat, Utc};
use po_errors::{AppError, AppResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::import::{record_rows, replace_nuevo_estatus};
use super::reconciler::finish;
use crate::domain::base_record::ImportSummary;
use crate::domain::events::{LiveUpdate, NotificationSink};
use crate::domain::repositories::{LastUpdateRepository, NuevoEstatusRepository};
use crate::domain::unit_of_work::UnitOfWorkFactory;

/// 整表替换结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NuevoEstatusImport {
    pub summary: ImportSummary,
    pub last_updated: String,
}

/// 当前时间（ISO-8601 UTC，毫秒精度）
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub struct NuevoEstatusService {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    rows: Arc<dyn NuevoEstatusRepository>,
    last_update: Arc<dyn LastUpdateRepository>,
    notifier: Arc<dyn NotificationSink>,
}

impl NuevoEstatusService {
    pub fn new(
        uow_factory: Arc<dyn UnitOfWorkFactory>,
        rows: Arc<dyn NuevoEstatusRepository>,
        last_update: Arc<dyn LastUpdateRepository>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            uow_factory,
            rows,
            last_update,
            notifier,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<Value>> {
        self.rows.list().await
    }

    pub async fn last_updated(&self) -> Option<String> {
        self.last_update.get().await
    }

    /// 整表替换（单一事务），提交后记录更新时间
    pub async fn replace(&self, rows: &[Value]) -> AppResult<NuevoEstatusImport> {
        let uow = self.uow_factory.begin().await?;
        let result = replace_nuevo_estatus(uow.as_ref(), rows).await;
        let summary = finish(uow, result).await?;
        record_rows("nuevo_estatus", &summary);

        let last_updated = timestamp_now();
        self.last_update.set(last_updated.clone()).await;

        info!(
            inserted = summary.inserted,
            skipped = summary.skipped,
            last_updated = %last_updated,
            "Nuevo estatus replaced"
        );
        self.notifier.publish(LiveUpdate::NuevoEstatusUpdated {
            last_updated: Some(last_updated.clone()),
        });

        Ok(NuevoEstatusImport {
            summary,
            last_updated,
        })
    }

    /// 按 id 删除
    pub async fn delete(&self, ids: &[i32]) -> AppResult<u64> {
        if ids.is_empty() {
            return Err(AppError::validation("No se enviaron IDs"));
        }

        let deleted = self.rows.delete(ids).await?;
        info!(deleted, "Nuevo estatus rows deleted");
        self.notifier.publish(LiveUpdate::NuevoEstatusUpdated {
            last_updated: self.last_update.get().await,
        });
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::MockNotificationSink;
    use crate::infrastructure::persistence::memory::{
        FailurePoint, InMemoryLastUpdate, InMemoryTrackingStore,
    };
    use serde_json::json;

    fn service(
        store: &InMemoryTrackingStore,
        last_update: Arc<InMemoryLastUpdate>,
        notifier: MockNotificationSink,
    ) -> NuevoEstatusService {
        NuevoEstatusService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            last_update,
            Arc::new(notifier),
        )
    }

    #[tokio::test]
    async fn test_replace_records_timestamp_and_notifies() {
        let store = InMemoryTrackingStore::new();
        store.seed_nuevo_estatus(json!({"PEDIDO": "old"})).await;
        let last_update = Arc::new(InMemoryLastUpdate::default());

        let mut notifier = MockNotificationSink::new();
        notifier
            .expect_publish()
            .withf(|update| {
                matches!(update, LiveUpdate::NuevoEstatusUpdated { last_updated: Some(_) })
            })
            .times(1)
            .return_const(());

        let service = service(&store, last_update.clone(), notifier);
        let result = service
            .replace(&[json!({"PEDIDO": "new", "FECHA_PEDIDO": "45000.5"})])
            .await
            .unwrap();

        assert_eq!(result.summary.inserted, 1);
        assert_eq!(service.last_updated().await, Some(result.last_updated.clone()));

        let rows = service.list().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["PEDIDO"], "new");
        assert_eq!(rows[0]["FECHA_PEDIDO"], "15/03/2023 12:00:00");
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_old_rows() {
        let store = InMemoryTrackingStore::new();
        store.seed_nuevo_estatus(json!({"PEDIDO": "old"})).await;
        store.fail_at(FailurePoint::NuevoEstatusInsert);
        let last_update = Arc::new(InMemoryLastUpdate::default());

        let mut notifier = MockNotificationSink::new();
        notifier.expect_publish().never();

        let service = service(&store, last_update.clone(), notifier);
        assert!(service.replace(&[json!({"PEDIDO": "new"})]).await.is_err());

        assert_eq!(service.last_updated().await, None);
        let rows = store.nuevo_estatus_rows().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["PEDIDO"], "old");
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryTrackingStore::new();
        let id = store.seed_nuevo_estatus(json!({"PEDIDO": "a"})).await;
        store.seed_nuevo_estatus(json!({"PEDIDO": "b"})).await;

        let mut notifier = MockNotificationSink::new();
        notifier.expect_publish().times(1).return_const(());
        let service = service(&store, Arc::new(InMemoryLastUpdate::default()), notifier);

        assert_eq!(service.delete(&[id]).await.unwrap(), 1);
        assert_eq!(service.list().await.unwrap().len(), 1);
        assert_eq!(service.delete(&[]).await.unwrap_err().status_code(), 400);
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp_now();
        assert_eq!(ts.len(), "2024-03-05T10:00:00.000Z".len());
        assert!(ts.ends_with('Z'));
    }
}
