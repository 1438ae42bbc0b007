//! 新状态表最后更新时间

use async_trait::async_trait;

#[async_trait]
pub trait LastUpdateRepository: Send + Sync {
    /// 当前记录的时间戳（ISO-8601 UTC）
    async fn get(&self) -> Option<String>;

    /// 记录新的时间戳；持久化失败只记录日志
    async fn set(&self, timestamp: String);
}
