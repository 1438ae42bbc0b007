//! PostgreSQL 用户仓储实现

use async_trait::async_trait;
use po_adapter_postgres::{is_unique_violation, map_sqlx_error};
use po_errors::{AppError, AppResult};
use sqlx::{FromRow, PgPool};

use crate::domain::repositories::UserRepository;
use crate::domain::user::{HashedPassword, Role, User};

#[derive(Debug, FromRow)]
struct UserRow {
    id: i32,
    usuario: String,
    rol: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            usuario: row.usuario,
            rol: row.rol,
        }
    }
}

#[derive(FromRow)]
struct CredentialRow {
    id: i32,
    usuario: String,
    rol: String,
    password: String,
}

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, usuario: &str, password: &HashedPassword, rol: Role) -> AppResult<()> {
        sqlx::query("INSERT INTO usuarios (usuario, password, rol) VALUES ($1, $2, $3)")
            .bind(usuario)
            .bind(password.as_str())
            .bind(rol.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::conflict(format!("User {} already exists", usuario))
                } else {
                    map_sqlx_error(e)
                }
            })?;

        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, UserRow>("SELECT id, usuario, rol FROM usuarios ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(map_sqlx_error)
    }

    async fn find_password(&self, id: i32) -> AppResult<Option<HashedPassword>> {
        sqlx::query_scalar::<_, String>("SELECT password FROM usuarios WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|hash| hash.map(HashedPassword::from_hash))
            .map_err(map_sqlx_error)
    }

    async fn find_by_username(&self, usuario: &str) -> AppResult<Option<(User, HashedPassword)>> {
        sqlx::query_as::<_, CredentialRow>(
            "SELECT id, usuario, rol, password FROM usuarios WHERE usuario = $1",
        )
        .bind(usuario)
        .fetch_optional(&self.pool)
        .await
        .map(|row| {
            row.map(|r| {
                (
                    User {
                        id: r.id,
                        usuario: r.usuario,
                        rol: r.rol,
                    },
                    HashedPassword::from_hash(r.password),
                )
            })
        })
        .map_err(map_sqlx_error)
    }

    async fn update_password(&self, id: i32, password: &HashedPassword) -> AppResult<u64> {
        let result = sqlx::query("UPDATE usuarios SET password = $1 WHERE id = $2")
            .bind(password.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn update_role(&self, id: i32, rol: Role) -> AppResult<u64> {
        let result = sqlx::query("UPDATE usuarios SET rol = $1 WHERE id = $2")
            .bind(rol.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
