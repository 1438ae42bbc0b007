//! 事务感知的 Repository 实现
//!
//! 这些 Repository 使用共享的 Transaction 而非 PgPool。

use async_trait::async_trait;
use po_adapter_postgres::map_sqlx_error;
use po_errors::{AppError, AppResult};
use sqlx::{Postgres, Transaction};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use super::sql::{insert_best_effort, normalized_pedido_sql, table_columns};
use crate::domain::base_record::{BASE_RECORDS_TABLE, ImportRow, NUEVO_ESTATUS_TABLE};
use crate::domain::pedido::NormalizedPedido;
use crate::domain::unit_of_work::{BaseRecordWriter, NuevoEstatusWriter, SupplierOrderWriter};

/// 共享事务类型
pub(crate) type SharedTx = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// 宏：定义一个简单的 TxRepository 结构体
macro_rules! define_tx_repo {
    ($name:ident) => {
        pub struct $name {
            tx: SharedTx,
        }

        impl $name {
            pub fn new(tx: SharedTx) -> Self {
                Self { tx }
            }

            async fn lock(&self) -> MutexGuard<'_, Option<Transaction<'static, Postgres>>> {
                self.tx.lock().await
            }
        }
    };
}

define_tx_repo!(TxBaseRecordRepository);
define_tx_repo!(TxSupplierOrderRepository);
define_tx_repo!(TxNuevoEstatusRepository);

fn consumed() -> AppError {
    AppError::internal("Transaction consumed")
}

// =============================================================================
// BaseRecordWriter 实现
// =============================================================================

#[async_trait]
impl BaseRecordWriter for TxBaseRecordRepository {
    async fn columns(&self) -> AppResult<HashSet<String>> {
        let mut guard = self.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;
        table_columns(tx, BASE_RECORDS_TABLE).await
    }

    async fn insert_row(&self, row: &ImportRow) -> AppResult<bool> {
        let mut guard = self.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;
        insert_best_effort(tx, BASE_RECORDS_TABLE, row).await
    }

    async fn sync_oc(&self) -> AppResult<u64> {
        let mut guard = self.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let sql = format!(
            r#"
            UPDATE base_datos AS b
            SET "OC" = o."ORDEN_PROVEEDOR"
            FROM ordenes_proveedor AS o
            WHERE {} = {}
            "#,
            normalized_pedido_sql(r#"b."PEDIDO""#),
            normalized_pedido_sql(r#"o."PEDIDO""#)
        );

        let result = sqlx::query(&sql)
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn clear_oc(&self, pedidos: &[NormalizedPedido]) -> AppResult<u64> {
        if pedidos.is_empty() {
            return Ok(0);
        }

        let mut guard = self.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let sql = format!(
            r#"UPDATE base_datos SET "OC" = '' WHERE {} = ANY($1)"#,
            normalized_pedido_sql(r#""PEDIDO""#)
        );
        let pedidos: Vec<String> = pedidos.iter().map(|p| p.as_str().to_string()).collect();

        let result = sqlx::query(&sql)
            .bind(&pedidos)
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// SupplierOrderWriter 实现
// =============================================================================

#[async_trait]
impl SupplierOrderWriter for TxSupplierOrderRepository {
    async fn delete_by_pedido(&self, pedido: &NormalizedPedido) -> AppResult<u64> {
        let mut guard = self.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let sql = format!(
            r#"DELETE FROM ordenes_proveedor WHERE {} = $1"#,
            normalized_pedido_sql(r#""PEDIDO""#)
        );
        let result = sqlx::query(&sql)
            .bind(pedido.as_str())
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn insert(&self, pedido: &NormalizedPedido, orden_proveedor: &str) -> AppResult<()> {
        let mut guard = self.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        sqlx::query(r#"INSERT INTO ordenes_proveedor ("PEDIDO", "ORDEN_PROVEEDOR") VALUES ($1, $2)"#)
            .bind(pedido.as_str())
            .bind(orden_proveedor)
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn pedidos_for_ids(&self, ids: &[i32]) -> AppResult<Vec<NormalizedPedido>> {
        let mut guard = self.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let sql = format!(
            "SELECT {} AS pedido_norm FROM ordenes_proveedor WHERE id = ANY($1)",
            normalized_pedido_sql(r#""PEDIDO""#)
        );
        let pedidos: Vec<Option<String>> = sqlx::query_scalar(&sql)
            .bind(ids)
            .fetch_all(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(pedidos
            .into_iter()
            .flatten()
            .map(|p| NormalizedPedido::normalize(&p))
            .filter(|p| !p.is_empty())
            .collect())
    }

    async fn delete_by_ids(&self, ids: &[i32]) -> AppResult<u64> {
        let mut guard = self.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let result = sqlx::query("DELETE FROM ordenes_proveedor WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// NuevoEstatusWriter 实现
// =============================================================================

#[async_trait]
impl NuevoEstatusWriter for TxNuevoEstatusRepository {
    async fn columns(&self) -> AppResult<HashSet<String>> {
        let mut guard = self.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;
        table_columns(tx, NUEVO_ESTATUS_TABLE).await
    }

    async fn delete_all(&self) -> AppResult<u64> {
        let mut guard = self.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let result = sqlx::query("DELETE FROM nuevo_estatus")
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn insert_row(&self, row: &ImportRow) -> AppResult<bool> {
        let mut guard = self.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;
        insert_best_effort(tx, NUEVO_ESTATUS_TABLE, row).await
    }
}
