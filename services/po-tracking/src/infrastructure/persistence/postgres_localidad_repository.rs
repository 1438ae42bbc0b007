//! PostgreSQL 地点目录仓储实现

use async_trait::async_trait;
use po_adapter_postgres::map_sqlx_error;
use po_errors::AppResult;
use sqlx::{FromRow, PgPool};

use crate::domain::localidad::{Localidad, NewLocalidad};
use crate::domain::repositories::LocalidadRepository;

#[derive(Debug, FromRow)]
struct LocalidadRow {
    id: i32,
    taller: String,
    localidad: String,
    #[sqlx(rename = "CODIGO")]
    codigo: Option<String>,
    #[sqlx(rename = "NOMBRE COMPAQ")]
    nombre_compaq: Option<String>,
    #[sqlx(rename = "NOMENCLATURA")]
    nomenclatura: Option<String>,
}

impl From<LocalidadRow> for Localidad {
    fn from(row: LocalidadRow) -> Self {
        Self {
            id: row.id,
            taller: row.taller,
            localidad: row.localidad,
            codigo: row.codigo,
            nombre_compaq: row.nombre_compaq,
            nomenclatura: row.nomenclatura,
        }
    }
}

pub struct PostgresLocalidadRepository {
    pool: PgPool,
}

impl PostgresLocalidadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocalidadRepository for PostgresLocalidadRepository {
    async fn list(&self) -> AppResult<Vec<Localidad>> {
        sqlx::query_as::<_, LocalidadRow>(
            r#"SELECT id, taller, localidad, "CODIGO", "NOMBRE COMPAQ", "NOMENCLATURA"
               FROM localidades ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Into::into).collect())
        .map_err(map_sqlx_error)
    }

    async fn insert_if_absent(&self, localidad: &NewLocalidad) -> AppResult<bool> {
        let result = sqlx::query(
            r#"INSERT INTO localidades (taller, localidad, "CODIGO", "NOMBRE COMPAQ", "NOMENCLATURA")
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT (taller, localidad) DO NOTHING"#,
        )
        .bind(&localidad.taller)
        .bind(&localidad.localidad)
        .bind(&localidad.codigo)
        .bind(&localidad.nombre_compaq)
        .bind(&localidad.nomenclatura)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn update(&self, id: i32, localidad: &NewLocalidad) -> AppResult<u64> {
        let result = sqlx::query(
            r#"UPDATE localidades
               SET taller = $1, localidad = $2, "CODIGO" = $3, "NOMBRE COMPAQ" = $4, "NOMENCLATURA" = $5
               WHERE id = $6"#,
        )
        .bind(&localidad.taller)
        .bind(&localidad.localidad)
        .bind(&localidad.codigo)
        .bind(&localidad.nombre_compaq)
        .bind(&localidad.nomenclatura)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i32) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM localidades WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
