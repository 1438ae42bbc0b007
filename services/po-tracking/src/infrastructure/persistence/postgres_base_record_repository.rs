//! PostgreSQL 基础数据仓储实现

use async_trait::async_trait;
use po_adapter_postgres::{map_sqlx_error, quote_ident};
use po_errors::AppResult;
use serde_json::Value;
use sqlx::PgPool;

use super::sql::select_rows_json_sql;
use crate::domain::base_record::{BASE_RECORDS_TABLE, CompaqStatus, EditableField};
use crate::domain::repositories::BaseRecordRepository;

pub struct PostgresBaseRecordRepository {
    pool: PgPool,
}

impl PostgresBaseRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseRecordRepository for PostgresBaseRecordRepository {
    async fn list_all(&self) -> AppResult<Vec<Value>> {
        sqlx::query_scalar(&select_rows_json_sql(BASE_RECORDS_TABLE, None))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_pending_capture(&self) -> AppResult<Vec<Value>> {
        let filter = format!(
            r#"UPPER(BTRIM(COALESCE(CAST(t."COMPAQ" AS TEXT), ''))) = '{}'"#,
            CompaqStatus::Generar.as_str()
        );
        sqlx::query_scalar(&select_rows_json_sql(BASE_RECORDS_TABLE, Some(&filter)))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn mark_generated(&self, ids: &[i32]) -> AppResult<u64> {
        let result = sqlx::query(r#"UPDATE base_datos SET "COMPAQ" = $1 WHERE id = ANY($2)"#)
            .bind(CompaqStatus::Generado.as_str())
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn update_field(&self, id: i32, field: EditableField, value: &str) -> AppResult<u64> {
        let sql = format!(
            "UPDATE base_datos SET {} = $1 WHERE id = $2",
            quote_ident(field.column())
        );
        let result = sqlx::query(&sql)
            .bind(value)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, ids: &[i32]) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM base_datos WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
