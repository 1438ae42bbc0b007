//! PostgreSQL 新状态表仓储实现

use async_trait::async_trait;
use po_adapter_postgres::map_sqlx_error;
use po_errors::AppResult;
use serde_json::Value;
use sqlx::PgPool;

use super::sql::select_rows_json_sql;
use crate::domain::base_record::NUEVO_ESTATUS_TABLE;
use crate::domain::repositories::NuevoEstatusRepository;

pub struct PostgresNuevoEstatusRepository {
    pool: PgPool,
}

impl PostgresNuevoEstatusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NuevoEstatusRepository for PostgresNuevoEstatusRepository {
    async fn list(&self) -> AppResult<Vec<Value>> {
        sqlx::query_scalar(&select_rows_json_sql(NUEVO_ESTATUS_TABLE, None))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete(&self, ids: &[i32]) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM nuevo_estatus WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
