//! 新状态表 Repository trait

use async_trait::async_trait;
use po_errors::AppResult;
use serde_json::Value;

#[async_trait]
pub trait NuevoEstatusRepository: Send + Sync {
    /// 全部记录（id 倒序）
    async fn list(&self) -> AppResult<Vec<Value>>;

    /// 按 id 删除，返回删除行数
    async fn delete(&self, ids: &[i32]) -> AppResult<u64>;
}
