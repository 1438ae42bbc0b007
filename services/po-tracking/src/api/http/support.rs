//! 处理器公用的请求体与错误转换

use po_errors::AppError;
use serde::Deserialize;
use serde_json::Value;
use tracing::error;

use crate::domain::values::parse_record_ids;

/// `{ "ids": [...] }`
#[derive(Debug, Default, Deserialize)]
pub struct IdsBody {
    #[serde(default)]
    pub ids: Value,
}

impl IdsBody {
    /// 缺失、非数组或含无效 id 时返回空列表
    pub fn ids(&self) -> Vec<i32> {
        parse_record_ids(&self.ids).unwrap_or_default()
    }
}

/// 非数组请求体按空列表处理
pub fn rows_of(body: Value) -> Vec<Value> {
    match body {
        Value::Array(rows) => rows,
        _ => Vec::new(),
    }
}

/// 服务端错误只向客户端返回固定消息，客户端错误原样返回
pub fn user_facing(message: &'static str) -> impl FnOnce(AppError) -> AppError {
    move |err| {
        if err.is_server_error() {
            error!(error = %err, "{}", message);
            AppError::internal(message)
        } else {
            err
        }
    }
}
