//! 地点目录 Repository trait

use async_trait::async_trait;
use po_errors::AppResult;

use crate::domain::localidad::{Localidad, NewLocalidad};

#[async_trait]
pub trait LocalidadRepository: Send + Sync {
    /// 全部地点（id 升序）
    async fn list(&self) -> AppResult<Vec<Localidad>>;

    /// 插入，(taller, localidad) 已存在时忽略；返回是否插入
    async fn insert_if_absent(&self, localidad: &NewLocalidad) -> AppResult<bool>;

    /// 更新，返回更新行数
    async fn update(&self, id: i32, localidad: &NewLocalidad) -> AppResult<u64>;

    /// 删除，返回删除行数
    async fn delete(&self, id: i32) -> AppResult<u64>;
}
