//! 用户与角色

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const USERS_TABLE: &str = "usuarios";

/// 角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Supervisor,
    Codificar,
    Seguimientos,
    Facturacion,
    Cancelaciones,
    Captura,
    Chofer,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Supervisor,
        Role::Codificar,
        Role::Seguimientos,
        Role::Facturacion,
        Role::Cancelaciones,
        Role::Captura,
        Role::Chofer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Supervisor => "Supervisor",
            Role::Codificar => "Codificar",
            Role::Seguimientos => "Seguimientos",
            Role::Facturacion => "Facturacion",
            Role::Cancelaciones => "Cancelaciones",
            Role::Captura => "Captura",
            Role::Chofer => "Chofer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 角色名区分大小写
impl FromStr for Role {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UserError::InvalidRole(s.to_string()))
    }
}

/// 用户（不含密码）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i32,
    pub usuario: String,
    pub rol: String,
}

/// 用户领域错误
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash: {0}")]
    InvalidHash(String),
}

/// 哈希后的密码
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// 从明文密码生成 Argon2 哈希
    pub fn from_plain(plain_password: &str) -> Result<Self, UserError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(plain_password.as_bytes(), &salt)
            .map_err(|e| UserError::HashingFailed(e.to_string()))?
            .to_string();

        Ok(Self(password_hash))
    }

    /// 验证明文密码是否匹配
    pub fn verify(&self, plain_password: &str) -> Result<bool, UserError> {
        let parsed_hash =
            PasswordHash::new(&self.0).map_err(|e| UserError::InvalidHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(plain_password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// 从已有的哈希字符串创建
    pub fn from_hash(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_names() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_is_case_sensitive() {
        assert!("supervisor".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hashed = HashedPassword::from_plain("clave-secreta").unwrap();
        assert!(hashed.as_str().starts_with("$argon2"));
        assert!(hashed.verify("clave-secreta").unwrap());
        assert!(!hashed.verify("otra").unwrap());
    }

    #[test]
    fn test_invalid_hash() {
        let hashed = HashedPassword::from_hash("plaintext".to_string());
        assert!(matches!(hashed.verify("plaintext"), Err(UserError::InvalidHash(_))));
    }

    #[test]
    fn test_debug_redacts_hash() {
        let hashed = HashedPassword::from_hash("$argon2id$abc".to_string());
        assert!(!format!("{:?}", hashed).contains("argon2"));
    }
}
