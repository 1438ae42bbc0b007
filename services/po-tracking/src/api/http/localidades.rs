//! /api/localidades

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post, put},
};
use po_errors::AppResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::basedatos::OkResponse;
use super::support::{rows_of, user_facing};
use crate::api::state::AppState;
use crate::domain::localidad::{Localidad, LocalidadInput};
use crate::domain::values::parse_record_id;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_localidades))
        .route("/cargar", post(load_localidades))
        .route("/editar", put(edit_localidad))
        .route("/eliminar", delete(delete_localidad))
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    #[serde(default)]
    pub id: Value,
    #[serde(flatten)]
    pub localidad: LocalidadInput,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub id: Value,
}

#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub ok: bool,
    pub insertados: u64,
}

async fn list_localidades(State(state): State<AppState>) -> AppResult<Json<Vec<Localidad>>> {
    let rows = state
        .localidades
        .list()
        .await
        .map_err(user_facing("Error al obtener localidades"))?;
    Ok(Json(rows))
}

async fn load_localidades(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<LoadResponse>> {
    let rows: Vec<LocalidadInput> = rows_of(body)
        .into_iter()
        .map(|row| serde_json::from_value(row).unwrap_or_default())
        .collect();

    let insertados = state
        .localidades
        .load(&rows)
        .await
        .map_err(user_facing("Error al cargar localidades"))?;
    Ok(Json(LoadResponse {
        ok: true,
        insertados,
    }))
}

async fn edit_localidad(
    State(state): State<AppState>,
    Json(body): Json<EditRequest>,
) -> AppResult<Json<OkResponse>> {
    state
        .localidades
        .edit(parse_record_id(&body.id), &body.localidad)
        .await
        .map_err(user_facing("Error al editar la localidad"))?;
    Ok(Json(OkResponse::ok()))
}

async fn delete_localidad(
    State(state): State<AppState>,
    Json(body): Json<DeleteRequest>,
) -> AppResult<Json<OkResponse>> {
    state
        .localidades
        .delete(parse_record_id(&body.id))
        .await
        .map_err(user_facing("Error al eliminar la localidad"))?;
    Ok(Json(OkResponse::ok()))
}
