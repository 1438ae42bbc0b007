//! 用户 Repository trait

use async_trait::async_trait;
use po_errors::AppResult;

use crate::domain::user::{HashedPassword, Role, User};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 创建用户，用户名重复时返回 Conflict
    async fn create(&self, usuario: &str, password: &HashedPassword, rol: Role) -> AppResult<()>;

    /// 全部用户（id 升序）
    async fn list(&self) -> AppResult<Vec<User>>;

    /// 根据 ID 查找密码哈希
    async fn find_password(&self, id: i32) -> AppResult<Option<HashedPassword>>;

    /// 根据用户名查找用户及密码哈希
    async fn find_by_username(&self, usuario: &str) -> AppResult<Option<(User, HashedPassword)>>;

    /// 更新密码，返回更新行数
    async fn update_password(&self, id: i32, password: &HashedPassword) -> AppResult<u64>;

    /// 更新角色，返回更新行数
    async fn update_role(&self, id: i32, rol: Role) -> AppResult<u64>;
}
