//! 内存实现
//!
//! 与 PostgreSQL 实现语义一致的内存存储，用于单元测试和流程测试。
//! 事务持有整个存储的锁，在副本上修改，提交时整体替换。

use async_trait::async_trait;
use po_errors::{AppError, AppResult};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::base_record::{
    BASE_RECORD_COLUMNS, CompaqStatus, EditableField, ImportRow, NOT_NULL_TEXT_COLUMNS,
    NUEVO_ESTATUS_COLUMNS,
};
use crate::domain::localidad::{Localidad, NewLocalidad};
use crate::domain::pedido::NormalizedPedido;
use crate::domain::repositories::{
    BaseRecordRepository, LastUpdateRepository, LocalidadRepository, NuevoEstatusRepository,
    SupplierOrderRepository, UserRepository,
};
use crate::domain::supplier_order::SupplierOrder;
use crate::domain::unit_of_work::{
    BaseRecordWriter, NuevoEstatusWriter, SupplierOrderWriter, UnitOfWork, UnitOfWorkFactory,
};
use crate::domain::user::{HashedPassword, Role, User};

type Row = Map<String, Value>;

/// 可注入的失败点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    SyncOc,
    ClearOc,
    BaseInsert,
    SupplierInsert,
    SupplierDelete,
    NuevoEstatusInsert,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    base_datos: Vec<Row>,
    ordenes_proveedor: Vec<SupplierOrder>,
    nuevo_estatus: Vec<Row>,
    usuarios: Vec<(User, HashedPassword)>,
    localidades: Vec<Localidad>,
    last_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn sync_oc(&mut self) -> u64 {
        let orders: Vec<(NormalizedPedido, String)> = self
            .ordenes_proveedor
            .iter()
            .map(|o| (NormalizedPedido::normalize(&o.pedido), o.orden_proveedor.clone()))
            .collect();

        let mut updated = 0;
        for row in &mut self.base_datos {
            let pedido = row_pedido(row);
            if let Some((_, code)) = orders.iter().find(|(p, _)| *p == pedido) {
                row.insert("OC".to_string(), Value::String(code.clone()));
                updated += 1;
            }
        }
        updated
    }

    fn clear_oc(&mut self, pedidos: &[NormalizedPedido]) -> u64 {
        let mut updated = 0;
        for row in &mut self.base_datos {
            if pedidos.contains(&row_pedido(row)) {
                row.insert("OC".to_string(), Value::String(String::new()));
                updated += 1;
            }
        }
        updated
    }
}

fn row_pedido(row: &Row) -> NormalizedPedido {
    NormalizedPedido::from_value(row.get("PEDIDO").unwrap_or(&Value::Null))
}

fn row_id(row: &Row) -> i32 {
    row.get("id")
        .and_then(Value::as_i64)
        .and_then(|id| i32::try_from(id).ok())
        .unwrap_or_default()
}

/// 按表结构补全一行，非空列默认空字符串，其余默认 null
fn complete_row(id: i32, columns: &[&str], mut values: Row) -> Row {
    let mut row = Row::new();
    row.insert("id".to_string(), Value::from(id));
    for column in columns {
        let default = if NOT_NULL_TEXT_COLUMNS.contains(column) {
            Value::String(String::new())
        } else {
            Value::Null
        };
        row.insert(
            column.to_string(),
            values.remove(*column).unwrap_or(default),
        );
    }
    row
}

/// 与 PostgreSQL 一致：含 NUL 的文本或非空列写入 null 时整行被拒绝
fn import_values(row: &ImportRow) -> Option<Row> {
    let mut values = Row::new();
    for (column, value) in row.columns().iter().zip(row.values()) {
        let rejected = match value {
            Some(text) => text.contains('\0'),
            None => NOT_NULL_TEXT_COLUMNS.contains(&column.as_str()),
        };
        if rejected {
            return None;
        }
        values.insert(
            column.clone(),
            value.clone().map(Value::String).unwrap_or(Value::Null),
        );
    }
    Some(values)
}

fn sorted_desc(rows: &[Row]) -> Vec<Value> {
    let mut rows: Vec<Row> = rows.to_vec();
    rows.sort_by_key(|row| std::cmp::Reverse(row_id(row)));
    rows.into_iter().map(Value::Object).collect()
}

fn column_set(columns: &[&str]) -> HashSet<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

/// 内存存储
#[derive(Clone, Default)]
pub struct InMemoryTrackingStore {
    tables: Arc<Mutex<Tables>>,
    failure: Arc<std::sync::Mutex<Option<FailurePoint>>>,
    write_statements: Arc<AtomicU64>,
}

impl InMemoryTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 之后到达该失败点的语句返回数据库错误
    pub fn fail_at(&self, point: FailurePoint) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(point);
        }
    }

    pub fn clear_failure(&self) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = None;
        }
    }

    /// 事务内执行过的写语句数
    pub fn write_statements(&self) -> u64 {
        self.write_statements.load(Ordering::SeqCst)
    }

    fn statement(&self, point: Option<FailurePoint>) -> AppResult<()> {
        self.write_statements.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .failure
            .lock()
            .map(|failure| point.is_some() && *failure == point)
            .unwrap_or(false);
        if injected {
            return Err(AppError::database(format!("Injected failure at {:?}", point)));
        }
        Ok(())
    }

    pub async fn seed_base_record(&self, values: Value) -> i32 {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        let values = match values {
            Value::Object(map) => map,
            _ => Row::new(),
        };
        tables
            .base_datos
            .push(complete_row(id, BASE_RECORD_COLUMNS, values));
        id
    }

    pub async fn seed_supplier_order(&self, pedido: &str, orden_proveedor: &str) -> i32 {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        tables.ordenes_proveedor.push(SupplierOrder {
            id,
            pedido: pedido.to_string(),
            orden_proveedor: orden_proveedor.to_string(),
        });
        id
    }

    pub async fn seed_nuevo_estatus(&self, values: Value) -> i32 {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        let values = match values {
            Value::Object(map) => map,
            _ => Row::new(),
        };
        tables
            .nuevo_estatus
            .push(complete_row(id, NUEVO_ESTATUS_COLUMNS, values));
        id
    }

    pub async fn set_oc_for_all(&self, code: &str) {
        let mut tables = self.tables.lock().await;
        for row in &mut tables.base_datos {
            row.insert("OC".to_string(), Value::String(code.to_string()));
        }
    }

    /// 基础记录（id 升序）
    pub async fn base_records(&self) -> Vec<Value> {
        let tables = self.tables.lock().await;
        tables.base_datos.iter().cloned().map(Value::Object).collect()
    }

    /// 各基础记录的 OC（id 升序）
    pub async fn oc_values(&self) -> Vec<String> {
        let tables = self.tables.lock().await;
        tables
            .base_datos
            .iter()
            .map(|row| {
                row.get("OC")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }

    /// 供应商订单（id 升序）
    pub async fn supplier_orders(&self) -> Vec<SupplierOrder> {
        self.tables.lock().await.ordenes_proveedor.clone()
    }

    pub async fn nuevo_estatus_rows(&self) -> Vec<Value> {
        let tables = self.tables.lock().await;
        tables.nuevo_estatus.iter().cloned().map(Value::Object).collect()
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryTrackingStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();

        Ok(Box::new(InMemoryUnitOfWork {
            store: self.clone(),
            guard,
            working: std::sync::Mutex::new(working),
        }))
    }
}

/// 内存事务
pub struct InMemoryUnitOfWork {
    store: InMemoryTrackingStore,
    guard: OwnedMutexGuard<Tables>,
    working: std::sync::Mutex<Tables>,
}

impl InMemoryUnitOfWork {
    fn with_working<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> AppResult<T> {
        let mut working = self
            .working
            .lock()
            .map_err(|_| AppError::internal("Transaction state poisoned"))?;
        Ok(f(&mut working))
    }

    fn insert_into(
        &self,
        point: FailurePoint,
        columns: &[&str],
        row: &ImportRow,
        target: fn(&mut Tables) -> &mut Vec<Row>,
    ) -> AppResult<bool> {
        self.store.statement(Some(point))?;
        let Some(values) = import_values(row) else {
            return Ok(false);
        };
        self.with_working(|tables| {
            let id = tables.next_id();
            target(tables).push(complete_row(id, columns, values));
            true
        })
    }
}

#[async_trait]
impl BaseRecordWriter for InMemoryUnitOfWork {
    async fn columns(&self) -> AppResult<HashSet<String>> {
        Ok(column_set(BASE_RECORD_COLUMNS))
    }

    async fn insert_row(&self, row: &ImportRow) -> AppResult<bool> {
        self.insert_into(FailurePoint::BaseInsert, BASE_RECORD_COLUMNS, row, |t| {
            &mut t.base_datos
        })
    }

    async fn sync_oc(&self) -> AppResult<u64> {
        self.store.statement(Some(FailurePoint::SyncOc))?;
        self.with_working(Tables::sync_oc)
    }

    async fn clear_oc(&self, pedidos: &[NormalizedPedido]) -> AppResult<u64> {
        if pedidos.is_empty() {
            return Ok(0);
        }
        self.store.statement(Some(FailurePoint::ClearOc))?;
        self.with_working(|tables| tables.clear_oc(pedidos))
    }
}

#[async_trait]
impl SupplierOrderWriter for InMemoryUnitOfWork {
    async fn delete_by_pedido(&self, pedido: &NormalizedPedido) -> AppResult<u64> {
        self.store.statement(Some(FailurePoint::SupplierDelete))?;
        self.with_working(|tables| {
            let before = tables.ordenes_proveedor.len();
            tables
                .ordenes_proveedor
                .retain(|o| NormalizedPedido::normalize(&o.pedido) != *pedido);
            (before - tables.ordenes_proveedor.len()) as u64
        })
    }

    async fn insert(&self, pedido: &NormalizedPedido, orden_proveedor: &str) -> AppResult<()> {
        self.store.statement(Some(FailurePoint::SupplierInsert))?;
        self.with_working(|tables| {
            let id = tables.next_id();
            tables.ordenes_proveedor.push(SupplierOrder {
                id,
                pedido: pedido.as_str().to_string(),
                orden_proveedor: orden_proveedor.to_string(),
            });
        })
    }

    async fn pedidos_for_ids(&self, ids: &[i32]) -> AppResult<Vec<NormalizedPedido>> {
        self.with_working(|tables| {
            tables
                .ordenes_proveedor
                .iter()
                .filter(|o| ids.contains(&o.id))
                .map(|o| NormalizedPedido::normalize(&o.pedido))
                .filter(|p| !p.is_empty())
                .collect()
        })
    }

    async fn delete_by_ids(&self, ids: &[i32]) -> AppResult<u64> {
        self.store.statement(Some(FailurePoint::SupplierDelete))?;
        self.with_working(|tables| {
            let before = tables.ordenes_proveedor.len();
            tables.ordenes_proveedor.retain(|o| !ids.contains(&o.id));
            (before - tables.ordenes_proveedor.len()) as u64
        })
    }
}

#[async_trait]
impl NuevoEstatusWriter for InMemoryUnitOfWork {
    async fn columns(&self) -> AppResult<HashSet<String>> {
        Ok(column_set(NUEVO_ESTATUS_COLUMNS))
    }

    async fn delete_all(&self) -> AppResult<u64> {
        self.store.statement(None)?;
        self.with_working(|tables| {
            let deleted = tables.nuevo_estatus.len() as u64;
            tables.nuevo_estatus.clear();
            deleted
        })
    }

    async fn insert_row(&self, row: &ImportRow) -> AppResult<bool> {
        self.insert_into(
            FailurePoint::NuevoEstatusInsert,
            NUEVO_ESTATUS_COLUMNS,
            row,
            |t| &mut t.nuevo_estatus,
        )
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn base_records(&self) -> &dyn BaseRecordWriter {
        self
    }

    fn supplier_orders(&self) -> &dyn SupplierOrderWriter {
        self
    }

    fn nuevo_estatus(&self) -> &dyn NuevoEstatusWriter {
        self
    }

    /// 事务本身已独占存储
    async fn lock_reconciliation(&self) -> AppResult<()> {
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let InMemoryUnitOfWork {
            mut guard, working, ..
        } = *self;
        *guard = working
            .into_inner()
            .map_err(|_| AppError::internal("Transaction state poisoned"))?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl BaseRecordRepository for InMemoryTrackingStore {
    async fn list_all(&self) -> AppResult<Vec<Value>> {
        Ok(sorted_desc(&self.tables.lock().await.base_datos))
    }

    async fn list_pending_capture(&self) -> AppResult<Vec<Value>> {
        let tables = self.tables.lock().await;
        let pending: Vec<Row> = tables
            .base_datos
            .iter()
            .filter(|row| {
                CompaqStatus::parse(row.get("COMPAQ").and_then(Value::as_str))
                    == CompaqStatus::Generar
            })
            .cloned()
            .collect();
        Ok(sorted_desc(&pending))
    }

    async fn mark_generated(&self, ids: &[i32]) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let mut updated = 0;
        for row in &mut tables.base_datos {
            if ids.contains(&row_id(row)) {
                row.insert(
                    "COMPAQ".to_string(),
                    Value::String(CompaqStatus::Generado.as_str().to_string()),
                );
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn update_field(&self, id: i32, field: EditableField, value: &str) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let mut updated = 0;
        for row in &mut tables.base_datos {
            if row_id(row) == id {
                row.insert(field.column().to_string(), Value::String(value.to_string()));
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete(&self, ids: &[i32]) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.base_datos.len();
        tables.base_datos.retain(|row| !ids.contains(&row_id(row)));
        Ok((before - tables.base_datos.len()) as u64)
    }
}

#[async_trait]
impl SupplierOrderRepository for InMemoryTrackingStore {
    async fn list(&self) -> AppResult<Vec<SupplierOrder>> {
        let mut orders = self.tables.lock().await.ordenes_proveedor.clone();
        orders.sort_by_key(|o| std::cmp::Reverse(o.id));
        Ok(orders)
    }
}

#[async_trait]
impl NuevoEstatusRepository for InMemoryTrackingStore {
    async fn list(&self) -> AppResult<Vec<Value>> {
        Ok(sorted_desc(&self.tables.lock().await.nuevo_estatus))
    }

    async fn delete(&self, ids: &[i32]) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.nuevo_estatus.len();
        tables.nuevo_estatus.retain(|row| !ids.contains(&row_id(row)));
        Ok((before - tables.nuevo_estatus.len()) as u64)
    }
}

#[async_trait]
impl UserRepository for InMemoryTrackingStore {
    async fn create(&self, usuario: &str, password: &HashedPassword, rol: Role) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.usuarios.iter().any(|(u, _)| u.usuario == usuario) {
            return Err(AppError::conflict("Duplicate entry violates unique constraint"));
        }
        let id = tables.next_id();
        tables.usuarios.push((
            User {
                id,
                usuario: usuario.to_string(),
                rol: rol.as_str().to_string(),
            },
            password.clone(),
        ));
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.usuarios.iter().map(|(u, _)| u.clone()).collect())
    }

    async fn find_password(&self, id: i32) -> AppResult<Option<HashedPassword>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .usuarios
            .iter()
            .find(|(u, _)| u.id == id)
            .map(|(_, p)| p.clone()))
    }

    async fn find_by_username(&self, usuario: &str) -> AppResult<Option<(User, HashedPassword)>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .usuarios
            .iter()
            .find(|(u, _)| u.usuario == usuario)
            .cloned())
    }

    async fn update_password(&self, id: i32, password: &HashedPassword) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let mut updated = 0;
        for (user, stored) in &mut tables.usuarios {
            if user.id == id {
                *stored = password.clone();
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn update_role(&self, id: i32, rol: Role) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let mut updated = 0;
        for (user, _) in &mut tables.usuarios {
            if user.id == id {
                user.rol = rol.as_str().to_string();
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl LocalidadRepository for InMemoryTrackingStore {
    async fn list(&self) -> AppResult<Vec<Localidad>> {
        Ok(self.tables.lock().await.localidades.clone())
    }

    async fn insert_if_absent(&self, localidad: &NewLocalidad) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        let exists = tables
            .localidades
            .iter()
            .any(|l| l.taller == localidad.taller && l.localidad == localidad.localidad);
        if exists {
            return Ok(false);
        }
        let id = tables.next_id();
        tables.localidades.push(Localidad {
            id,
            taller: localidad.taller.clone(),
            localidad: localidad.localidad.clone(),
            codigo: localidad.codigo.clone(),
            nombre_compaq: localidad.nombre_compaq.clone(),
            nomenclatura: localidad.nomenclatura.clone(),
        });
        Ok(true)
    }

    async fn update(&self, id: i32, localidad: &NewLocalidad) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let mut updated = 0;
        for saved in &mut tables.localidades {
            if saved.id == id {
                saved.taller = localidad.taller.clone();
                saved.localidad = localidad.localidad.clone();
                saved.codigo = localidad.codigo.clone();
                saved.nombre_compaq = localidad.nombre_compaq.clone();
                saved.nomenclatura = localidad.nomenclatura.clone();
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete(&self, id: i32) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.localidades.len();
        tables.localidades.retain(|l| l.id != id);
        Ok((before - tables.localidades.len()) as u64)
    }
}

/// 内存中的最后更新时间
#[derive(Debug, Default)]
pub struct InMemoryLastUpdate {
    value: RwLock<Option<String>>,
}

#[async_trait]
impl LastUpdateRepository for InMemoryLastUpdate {
    async fn get(&self) -> Option<String> {
        self.value.read().await.clone()
    }

    async fn set(&self, timestamp: String) {
        *self.value.write().await = Some(timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_rollback_discards_changes() {
        let store = InMemoryTrackingStore::new();

        let uow = store.begin().await.unwrap();
        uow.supplier_orders()
            .insert(&NormalizedPedido::normalize("1"), "SP")
            .await
            .unwrap();
        uow.rollback().await.unwrap();

        assert!(store.supplier_orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_null_in_not_null_column_is_rejected() {
        let store = InMemoryTrackingStore::new();
        let mut row = ImportRow::default();
        row.push("PEDIDO".into(), Some("1".into()));
        row.push("OC".into(), None);

        let uow = store.begin().await.unwrap();
        assert!(!uow.base_records().insert_row(&row).await.unwrap());
        uow.commit().await.unwrap();

        assert!(store.oc_values().await.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_discards_changes() {
        let store = InMemoryTrackingStore::new();

        {
            let uow = store.begin().await.unwrap();
            uow.supplier_orders()
                .insert(&NormalizedPedido::normalize("1"), "SP")
                .await
                .unwrap();
        }

        assert!(store.supplier_orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = InMemoryTrackingStore::new();
        store.fail_at(FailurePoint::SupplierInsert);

        let uow = store.begin().await.unwrap();
        let result = uow
            .supplier_orders()
            .insert(&NormalizedPedido::normalize("1"), "SP")
            .await;
        assert!(result.is_err());
        uow.rollback().await.unwrap();

        store.clear_failure();
        let uow = store.begin().await.unwrap();
        assert!(uow
            .supplier_orders()
            .insert(&NormalizedPedido::normalize("1"), "SP")
            .await
            .is_ok());
        uow.commit().await.unwrap();
        assert_eq!(store.supplier_orders().await.len(), 1);
    }

    #[tokio::test]
    async fn test_seeded_record_has_defaults() {
        let store = InMemoryTrackingStore::new();
        store.seed_base_record(json!({"PEDIDO": "5"})).await;

        let records = store.base_records().await;
        assert_eq!(records[0]["OC"], "");
        assert_eq!(records[0]["COMPAQ"], "");
        assert_eq!(records[0]["CHOFER"], Value::Null);
    }
}
