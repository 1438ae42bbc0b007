//! 基础数据的单条编辑与批量操作

use po_errors::{AppError, AppResult};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::domain::base_record::EditableField;
use crate::domain::events::{LiveUpdate, NotificationSink, RecordChange};
use crate::domain::repositories::BaseRecordRepository;
use crate::domain::values::parse_record_id;

/// 单元格更新结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellUpdate {
    pub id: i32,
    pub field: String,
    pub value: String,
}

/// 编辑界面
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditScope {
    /// 采集界面（CODIGO、CHOFER）
    Captura,
    /// 状态界面（ESTATUS_LOCAL、ESTATUS_FORANEO、ESTATUS2、LOCALIDAD）
    Estatus,
}

impl EditScope {
    fn field(&self, name: &str) -> Option<EditableField> {
        match self {
            Self::Captura => EditableField::captura(name),
            Self::Estatus => EditableField::estatus(name),
        }
    }

    fn change(&self, update: &CellUpdate) -> RecordChange {
        let CellUpdate { id, field, value } = update.clone();
        match self {
            Self::Captura => RecordChange::CapturaCellUpdate { id, field, value },
            Self::Estatus => RecordChange::EstatusUpdate { id, field, value },
        }
    }
}

pub struct RecordService {
    records: Arc<dyn BaseRecordRepository>,
    notifier: Arc<dyn NotificationSink>,
}

impl RecordService {
    pub fn new(records: Arc<dyn BaseRecordRepository>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self { records, notifier }
    }

    pub async fn list_all(&self) -> AppResult<Vec<Value>> {
        self.records.list_all().await
    }

    pub async fn list_pending_capture(&self) -> AppResult<Vec<Value>> {
        self.records.list_pending_capture().await
    }

    /// 标记为已生成
    pub async fn mark_generated(&self, ids: &[i32]) -> AppResult<u64> {
        if ids.is_empty() {
            return Err(AppError::validation("No se enviaron registros."));
        }

        let updated = self.records.mark_generated(ids).await?;
        info!(updated, "Records marked as generated");
        self.notifier.publish(LiveUpdate::ExcelDataUpdated(None));
        Ok(updated)
    }

    /// 更新单个白名单字段
    pub async fn update_cell(
        &self,
        scope: EditScope,
        id: &Value,
        field: &str,
        value: &Value,
    ) -> AppResult<CellUpdate> {
        let id = parse_record_id(id).ok_or_else(|| AppError::validation("ID inválido."))?;
        let field = scope
            .field(field)
            .ok_or_else(|| AppError::validation("Campo no permitido."))?;
        let value = field.prepare_value(value);

        let updated = self.records.update_field(id, field, &value).await?;
        if updated == 0 {
            return Err(AppError::not_found("Registro no encontrado."));
        }

        let update = CellUpdate {
            id,
            field: field.column().to_string(),
            value,
        };
        info!(id, field = %update.field, "Record field updated");
        self.notifier
            .publish(LiveUpdate::ExcelDataUpdated(Some(scope.change(&update))));
        Ok(update)
    }

    /// 按 id 删除
    pub async fn delete(&self, ids: &[i32]) -> AppResult<u64> {
        if ids.is_empty() {
            return Err(AppError::validation("No se enviaron IDs"));
        }

        let deleted = self.records.delete(ids).await?;
        info!(deleted, "Records deleted");
        self.notifier.publish(LiveUpdate::ExcelDataUpdated(None));
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::MockNotificationSink;
    use crate::infrastructure::persistence::memory::InMemoryTrackingStore;
    use serde_json::json;

    fn service(store: &InMemoryTrackingStore, notifier: MockNotificationSink) -> RecordService {
        RecordService::new(Arc::new(store.clone()), Arc::new(notifier))
    }

    fn quiet() -> MockNotificationSink {
        let mut notifier = MockNotificationSink::new();
        notifier.expect_publish().return_const(());
        notifier
    }

    #[tokio::test]
    async fn test_captura_update_trims_value_and_notifies() {
        let store = InMemoryTrackingStore::new();
        let id = store.seed_base_record(json!({"PEDIDO": "1"})).await;

        let mut notifier = MockNotificationSink::new();
        notifier
            .expect_publish()
            .withf(move |update| {
                *update
                    == LiveUpdate::ExcelDataUpdated(Some(RecordChange::CapturaCellUpdate {
                        id,
                        field: "CHOFER".into(),
                        value: "Luis".into(),
                    }))
            })
            .times(1)
            .return_const(());

        let update = service(&store, notifier)
            .update_cell(EditScope::Captura, &json!(id.to_string()), "CHOFER", &json!("  Luis "))
            .await
            .unwrap();

        assert_eq!(update.value, "Luis");
        let records = store.base_records().await;
        assert_eq!(records[0]["CHOFER"], "Luis");
    }

    #[tokio::test]
    async fn test_estatus_update_keeps_whitespace() {
        let store = InMemoryTrackingStore::new();
        let id = store.seed_base_record(json!({"PEDIDO": "1"})).await;

        let update = service(&store, quiet())
            .update_cell(EditScope::Estatus, &json!(id), "ESTATUS2", &json!(" EN RUTA "))
            .await
            .unwrap();

        assert_eq!(update.value, " EN RUTA ");
    }

    #[tokio::test]
    async fn test_update_rejects_fields_outside_scope() {
        let store = InMemoryTrackingStore::new();
        let id = store.seed_base_record(json!({"PEDIDO": "1"})).await;
        let service = service(&store, quiet());

        let err = service
            .update_cell(EditScope::Captura, &json!(id), "OC", &json!("x"))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Campo no permitido.");

        let err = service
            .update_cell(EditScope::Estatus, &json!(id), "CODIGO", &json!("x"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_update_invalid_and_missing_ids() {
        let store = InMemoryTrackingStore::new();
        let service = service(&store, quiet());

        let err = service
            .update_cell(EditScope::Captura, &json!("abc"), "CODIGO", &json!("x"))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "ID inválido.");

        let err = service
            .update_cell(EditScope::Captura, &json!(404), "CODIGO", &json!("x"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_mark_generated() {
        let store = InMemoryTrackingStore::new();
        let id = store
            .seed_base_record(json!({"PEDIDO": "1", "COMPAQ": "GENERAR"}))
            .await;
        let service = service(&store, quiet());

        assert_eq!(service.list_pending_capture().await.unwrap().len(), 1);
        assert_eq!(service.mark_generated(&[id]).await.unwrap(), 1);
        assert!(service.list_pending_capture().await.unwrap().is_empty());
        assert!(service.mark_generated(&[]).await.is_err());
    }
}
