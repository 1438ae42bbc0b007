//! /api/nuevo-estatus

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post},
};
use po_errors::AppResult;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use super::basedatos::OkResponse;
use super::support::{IdsBody, rows_of, user_facing};
use crate::api::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/obtener", get(list_rows))
        .route("/insertar", post(replace_rows))
        .route("/borrar", delete(delete_rows))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowsResponse {
    pub rows: Vec<Value>,
    pub last_updated: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceResponse {
    pub ok: bool,
    pub last_updated: String,
    pub insertados: u64,
    pub omitidos: u64,
}

async fn list_rows(State(state): State<AppState>) -> Json<RowsResponse> {
    let rows = state.nuevo_estatus.list().await.unwrap_or_else(|e| {
        error!(error = %e, "Failed to list nuevo estatus");
        Vec::new()
    });
    Json(RowsResponse {
        rows,
        last_updated: state.nuevo_estatus.last_updated().await,
    })
}

async fn replace_rows(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<ReplaceResponse>> {
    let result = state
        .nuevo_estatus
        .replace(&rows_of(body))
        .await
        .map_err(user_facing("Error al insertar en nuevo estatus."))?;
    Ok(Json(ReplaceResponse {
        ok: true,
        last_updated: result.last_updated,
        insertados: result.summary.inserted,
        omitidos: result.summary.skipped,
    }))
}

async fn delete_rows(
    State(state): State<AppState>,
    Json(body): Json<IdsBody>,
) -> AppResult<Json<OkResponse>> {
    state
        .nuevo_estatus
        .delete(&body.ids())
        .await
        .map_err(user_facing("Error al borrar"))?;
    Ok(Json(OkResponse::with_message("Registros borrados")))
}
