//! PostgreSQL 供应商订单仓储实现

use async_trait::async_trait;
use po_adapter_postgres::map_sqlx_error;
use po_errors::AppResult;
use sqlx::{FromRow, PgPool};

use crate::domain::repositories::SupplierOrderRepository;
use crate::domain::supplier_order::SupplierOrder;

#[derive(Debug, FromRow)]
struct SupplierOrderRow {
    id: i32,
    #[sqlx(rename = "PEDIDO")]
    pedido: Option<String>,
    #[sqlx(rename = "ORDEN_PROVEEDOR")]
    orden_proveedor: Option<String>,
}

impl From<SupplierOrderRow> for SupplierOrder {
    fn from(row: SupplierOrderRow) -> Self {
        Self {
            id: row.id,
            pedido: row.pedido.unwrap_or_default(),
            orden_proveedor: row.orden_proveedor.unwrap_or_default(),
        }
    }
}

pub struct PostgresSupplierOrderRepository {
    pool: PgPool,
}

impl PostgresSupplierOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SupplierOrderRepository for PostgresSupplierOrderRepository {
    async fn list(&self) -> AppResult<Vec<SupplierOrder>> {
        sqlx::query_as::<_, SupplierOrderRow>(
            r#"SELECT id, "PEDIDO", "ORDEN_PROVEEDOR" FROM ordenes_proveedor ORDER BY id DESC"#,
        )
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Into::into).collect())
        .map_err(map_sqlx_error)
    }
}
