//! 用户管理与登录

use po_errors::{AppError, AppResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::repositories::UserRepository;
use crate::domain::user::{HashedPassword, Role, User, UserError};

/// 登录结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    pub username: String,
    pub role: String,
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::InvalidRole(_) => AppError::validation("Rol no válido"),
            other => AppError::internal(other.to_string()),
        }
    }
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn create(&self, usuario: &str, password: &str, rol: &str) -> AppResult<()> {
        if usuario.is_empty() || password.is_empty() || rol.is_empty() {
            return Err(AppError::validation("Faltan datos"));
        }
        let rol: Role = rol.parse()?;
        let hashed = HashedPassword::from_plain(password)?;

        self.users
            .create(usuario, &hashed, rol)
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => AppError::conflict("El usuario ya existe"),
                other => other,
            })?;

        info!(usuario, rol = %rol, "User created");
        Ok(())
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.users.list().await
    }

    pub async fn change_password(&self, id: i32, current: &str, new: &str) -> AppResult<()> {
        if current.is_empty() || new.is_empty() {
            return Err(AppError::validation(
                "Debes proporcionar la contraseña anterior y la nueva.",
            ));
        }

        let stored = self
            .users
            .find_password(id)
            .await?
            .ok_or_else(|| AppError::not_found("Usuario no encontrado"))?;

        if !matches_password(&stored, current) {
            return Err(AppError::unauthorized("La contraseña anterior no coincide"));
        }

        let hashed = HashedPassword::from_plain(new)?;
        self.users.update_password(id, &hashed).await?;
        info!(id, "Password changed");
        Ok(())
    }

    pub async fn change_role(&self, id: i32, rol: &str) -> AppResult<()> {
        let rol: Role = rol.parse()?;
        let updated = self.users.update_role(id, rol).await?;
        if updated == 0 {
            return Err(AppError::not_found("Usuario no encontrado"));
        }
        info!(id, rol = %rol, "Role changed");
        Ok(())
    }

    pub async fn login(&self, usuario: &str, password: &str) -> AppResult<LoginOutcome> {
        let invalid = || AppError::unauthorized("Usuario o contraseña incorrectos");

        if usuario.is_empty() || password.is_empty() {
            return Err(invalid());
        }

        let (user, stored) = self
            .users
            .find_by_username(usuario)
            .await?
            .ok_or_else(invalid)?;

        if !matches_password(&stored, password) {
            warn!(usuario, "Login rejected");
            return Err(invalid());
        }

        info!(usuario, "Login succeeded");
        Ok(LoginOutcome {
            username: user.usuario,
            role: user.rol,
        })
    }
}

/// 无法解析的哈希视为不匹配
fn matches_password(stored: &HashedPassword, candidate: &str) -> bool {
    match stored.verify(candidate) {
        Ok(matches) => matches,
        Err(e) => {
            warn!(error = %e, "Stored password hash is unreadable");
            false
        }
    }
}
