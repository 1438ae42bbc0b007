//! 地点目录维护

use po_errors::{AppError, AppResult};
use std::sync::Arc;
use tracing::info;

use crate::domain::localidad::{Localidad, LocalidadInput};
use crate::domain::repositories::LocalidadRepository;

pub struct LocalidadService {
    localidades: Arc<dyn LocalidadRepository>,
}

impl LocalidadService {
    pub fn new(localidades: Arc<dyn LocalidadRepository>) -> Self {
        Self { localidades }
    }

    pub async fn list(&self) -> AppResult<Vec<Localidad>> {
        self.localidades.list().await
    }

    /// 批量载入，跳过缺少 taller/localidad 的行与已存在的组合，返回插入行数
    pub async fn load(&self, rows: &[LocalidadInput]) -> AppResult<u64> {
        if rows.is_empty() {
            return Err(AppError::validation("No hay datos para cargar"));
        }

        let mut inserted = 0;
        for row in rows {
            let Some(localidad) = row.validate() else {
                continue;
            };
            if self.localidades.insert_if_absent(&localidad).await? {
                inserted += 1;
            }
        }

        info!(inserted, received = rows.len(), "Localidades loaded");
        Ok(inserted)
    }

    pub async fn edit(&self, id: Option<i32>, row: &LocalidadInput) -> AppResult<()> {
        let (Some(id), Some(localidad)) = (id, row.validate()) else {
            return Err(AppError::validation("Datos incompletos"));
        };

        if self.localidades.update(id, &localidad).await? == 0 {
            return Err(AppError::not_found("Localidad no encontrada"));
        }
        Ok(())
    }

    pub async fn delete(&self, id: Option<i32>) -> AppResult<()> {
        let id = id.ok_or_else(|| AppError::validation("ID requerido"))?;

        if self.localidades.delete(id).await? == 0 {
            return Err(AppError::not_found("Localidad no encontrada"));
        }
        Ok(())
    }
}
