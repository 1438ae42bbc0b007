//! 基础数据 Repository trait

use async_trait::async_trait;
use po_errors::AppResult;
use serde_json::Value;

use crate::domain::base_record::EditableField;

#[async_trait]
pub trait BaseRecordRepository: Send + Sync {
    /// 全部记录（id 倒序），每行为列名到值的 JSON 对象
    async fn list_all(&self) -> AppResult<Vec<Value>>;

    /// COMPAQ 为 GENERAR 的记录（id 倒序）
    async fn list_pending_capture(&self) -> AppResult<Vec<Value>>;

    /// 将 COMPAQ 标记为 GENERADO，返回更新行数
    async fn mark_generated(&self, ids: &[i32]) -> AppResult<u64>;

    /// 更新单个白名单字段，返回更新行数
    async fn update_field(&self, id: i32, field: EditableField, value: &str) -> AppResult<u64>;

    /// 按 id 删除，返回删除行数
    async fn delete(&self, ids: &[i32]) -> AppResult<u64>;
}
