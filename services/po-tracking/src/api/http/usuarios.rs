//! /api/usuarios 与 /api/login

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use po_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use super::basedatos::OkResponse;
use super::support::user_facing;
use crate::api::state::AppState;
use crate::application::LoginOutcome;
use crate::domain::user::User;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/crear", post(create_user))
        .route("/listar", get(list_users))
        .route("/{id}/password", put(change_password))
        .route("/{id}", put(change_role))
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub usuario: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub rol: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub password_actual: String,
    #[serde(default)]
    pub password_nueva: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeRoleRequest {
    #[serde(default)]
    pub rol: String,
}

/// 接受 usuario/username 与 password/contraseña 两种写法
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub usuario: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "contraseña")]
    pub contrasena: Option<String>,
}

impl LoginRequest {
    fn credentials(self) -> (String, String) {
        let usuario = first_non_empty(self.usuario, self.username);
        let password = first_non_empty(self.password, self.contrasena);
        (usuario, password)
    }
}

fn first_non_empty(primary: Option<String>, fallback: Option<String>) -> String {
    primary
        .filter(|value| !value.is_empty())
        .or(fallback)
        .unwrap_or_default()
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub outcome: LoginOutcome,
}

/// 路径中的 id 不是整数时视为用户不存在
fn user_id(raw: &str) -> AppResult<i32> {
    raw.parse()
        .map_err(|_| AppError::not_found("Usuario no encontrado"))
}

async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> AppResult<Json<OkResponse>> {
    state
        .users
        .create(&body.usuario, &body.password, &body.rol)
        .await
        .map_err(user_facing("Error en el servidor"))?;
    Ok(Json(OkResponse::with_message("Usuario creado correctamente")))
}

async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let users = state
        .users
        .list()
        .await
        .map_err(user_facing("Error en el servidor"))?;
    Ok(Json(users))
}

async fn change_password(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ChangePasswordRequest>,
) -> AppResult<Json<OkResponse>> {
    let id = user_id(&id)?;
    state
        .users
        .change_password(id, &body.password_actual, &body.password_nueva)
        .await
        .map_err(user_facing("Error al actualizar la contraseña"))?;
    Ok(Json(OkResponse::with_message("Contraseña actualizada")))
}

async fn change_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ChangeRoleRequest>,
) -> AppResult<Json<OkResponse>> {
    let id = user_id(&id)?;
    state
        .users
        .change_role(id, &body.rol)
        .await
        .map_err(user_facing("Error al actualizar el usuario"))?;
    Ok(Json(OkResponse::with_message("Rol actualizado")))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (usuario, password) = body.credentials();
    let outcome = state
        .users
        .login(&usuario, &password)
        .await
        .map_err(user_facing("Error en el servidor"))?;
    Ok(Json(LoginResponse { ok: true, outcome }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_request_accepts_both_spellings() {
        let body: LoginRequest =
            serde_json::from_value(json!({"username": "ana", "contraseña": "pw"})).unwrap();
        assert_eq!(body.credentials(), ("ana".to_string(), "pw".to_string()));

        let body: LoginRequest = serde_json::from_value(
            json!({"usuario": "", "username": "ana", "password": "x", "contraseña": "y"}),
        )
        .unwrap();
        assert_eq!(body.credentials(), ("ana".to_string(), "x".to_string()));
    }

    #[test]
    fn test_user_id() {
        assert_eq!(user_id("12").unwrap(), 12);
        assert_eq!(user_id("abc").unwrap_err().status_code(), 404);
    }
}
