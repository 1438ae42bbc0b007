//! /api/basedatos

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post, put},
};
use po_errors::AppResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use super::support::{IdsBody, rows_of, user_facing};
use crate::api::state::AppState;
use crate::application::{CellUpdate, EditScope};
use crate::domain::supplier_order::{SupplierOrder, SupplierOrderInput};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/obtener", get(list_records))
        .route("/captura/generar", get(list_pending_capture))
        .route("/captura/marcar-generado", put(mark_generated))
        .route("/captura/actualizar-celda", post(update_captura_cell))
        .route("/actualizar-estatus", put(update_estatus))
        .route("/insertar", post(import_records))
        .route("/borrar", delete(delete_records))
        .route("/ordenes-proveedor/obtener", get(list_supplier_orders))
        .route("/ordenes-proveedor/insertar", post(upsert_supplier_orders))
        .route("/ordenes-proveedor/borrar", delete(delete_supplier_orders))
        .route("/ordenes-proveedor/sincronizar", post(sync_supplier_orders))
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mensaje: Option<&'static str>,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            mensaje: None,
        }
    }

    pub fn with_message(mensaje: &'static str) -> Self {
        Self {
            ok: true,
            mensaje: Some(mensaje),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub ok: bool,
    pub actualizados: u64,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub ok: bool,
    pub insertados: u64,
    pub omitidos: u64,
}

#[derive(Debug, Serialize)]
pub struct CellResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub update: CellUpdate,
}

#[derive(Debug, Deserialize)]
pub struct CellRequest {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub field: Value,
    #[serde(default)]
    pub value: Value,
}

async fn list_records(State(state): State<AppState>) -> Json<Vec<Value>> {
    match state.records.list_all().await {
        Ok(rows) => Json(rows),
        Err(e) => {
            error!(error = %e, "Failed to list base records");
            Json(Vec::new())
        }
    }
}

async fn list_pending_capture(State(state): State<AppState>) -> AppResult<Json<Vec<Value>>> {
    let rows = state
        .records
        .list_pending_capture()
        .await
        .map_err(user_facing("Error al obtener datos para captura."))?;
    Ok(Json(rows))
}

async fn mark_generated(
    State(state): State<AppState>,
    Json(body): Json<IdsBody>,
) -> AppResult<Json<UpdatedResponse>> {
    let actualizados = state
        .records
        .mark_generated(&body.ids())
        .await
        .map_err(user_facing("No se pudo actualizar los registros."))?;
    Ok(Json(UpdatedResponse {
        ok: true,
        actualizados,
    }))
}

async fn update_cell(
    state: &AppState,
    scope: EditScope,
    body: CellRequest,
    failure: &'static str,
) -> AppResult<Json<CellResponse>> {
    let field = body.field.as_str().unwrap_or_default();
    let update = state
        .records
        .update_cell(scope, &body.id, field, &body.value)
        .await
        .map_err(user_facing(failure))?;
    Ok(Json(CellResponse { ok: true, update }))
}

async fn update_captura_cell(
    State(state): State<AppState>,
    Json(body): Json<CellRequest>,
) -> AppResult<Json<CellResponse>> {
    update_cell(
        &state,
        EditScope::Captura,
        body,
        "Error al actualizar el registro.",
    )
    .await
}

async fn update_estatus(
    State(state): State<AppState>,
    Json(body): Json<CellRequest>,
) -> AppResult<Json<CellResponse>> {
    update_cell(&state, EditScope::Estatus, body, "Error al actualizar estatus.").await
}

async fn import_records(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<ImportResponse>> {
    let summary = state
        .imports
        .import_base_records(&rows_of(body))
        .await
        .map_err(user_facing("Error al insertar los registros."))?;
    Ok(Json(ImportResponse {
        ok: true,
        insertados: summary.inserted,
        omitidos: summary.skipped,
    }))
}

async fn delete_records(
    State(state): State<AppState>,
    Json(body): Json<IdsBody>,
) -> AppResult<Json<OkResponse>> {
    state
        .records
        .delete(&body.ids())
        .await
        .map_err(user_facing("Error al borrar"))?;
    Ok(Json(OkResponse::with_message("Registros borrados")))
}

async fn list_supplier_orders(State(state): State<AppState>) -> Json<Vec<SupplierOrder>> {
    match state.supplier_orders.list().await {
        Ok(rows) => Json(rows),
        Err(e) => {
            error!(error = %e, "Failed to list supplier orders");
            Json(Vec::new())
        }
    }
}

async fn upsert_supplier_orders(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<ImportResponse>> {
    // 无法解析的行按空行处理，由校验计入跳过
    let rows: Vec<SupplierOrderInput> = rows_of(body)
        .into_iter()
        .map(|row| serde_json::from_value(row).unwrap_or_default())
        .collect();

    let summary = state
        .reconciler
        .upsert(&rows)
        .await
        .map_err(user_facing("Error en la carga masiva."))?;
    Ok(Json(ImportResponse {
        ok: true,
        insertados: summary.inserted,
        omitidos: summary.skipped,
    }))
}

async fn delete_supplier_orders(
    State(state): State<AppState>,
    Json(body): Json<IdsBody>,
) -> AppResult<Json<OkResponse>> {
    state
        .reconciler
        .delete(&body.ids())
        .await
        .map_err(user_facing("Error al borrar"))?;
    Ok(Json(OkResponse::ok()))
}

async fn sync_supplier_orders(State(state): State<AppState>) -> AppResult<Json<UpdatedResponse>> {
    let actualizados = state
        .reconciler
        .sync()
        .await
        .map_err(user_facing("No se pudo sincronizar."))?;
    Ok(Json(UpdatedResponse {
        ok: true,
        actualizados,
    }))
}
