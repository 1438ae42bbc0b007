//! 实时更新通知
//!
//! 客户端收到的消息格式为 `{"event": <名称>, "data": <负载或 null>}`。

use serde::Serialize;
use serde_json::{Value, json};

/// 单条记录变更
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordChange {
    CapturaCellUpdate {
        id: i32,
        field: String,
        value: String,
    },
    EstatusUpdate {
        id: i32,
        field: String,
        value: String,
    },
}

/// 推送给客户端的更新
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveUpdate {
    /// base_datos 变更；None 表示批量变更，客户端应整体刷新
    ExcelDataUpdated(Option<RecordChange>),
    /// nuevo_estatus 变更
    NuevoEstatusUpdated { last_updated: Option<String> },
}

impl LiveUpdate {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::ExcelDataUpdated(_) => "excel_data_updated",
            Self::NuevoEstatusUpdated { .. } => "nuevo_estatus_updated",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            Self::ExcelDataUpdated(None) => Value::Null,
            Self::ExcelDataUpdated(Some(change)) => {
                serde_json::to_value(change).unwrap_or(Value::Null)
            }
            Self::NuevoEstatusUpdated { last_updated } => json!({ "lastUpdated": last_updated }),
        }
    }

    /// 序列化为 WebSocket 文本消息
    pub fn to_message(&self) -> String {
        json!({
            "event": self.event_name(),
            "data": self.payload(),
        })
        .to_string()
    }
}

/// 通知出口
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    /// 发布更新（无订阅者时静默丢弃）
    fn publish(&self, update: LiveUpdate);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_update_message() {
        let message: Value =
            serde_json::from_str(&LiveUpdate::ExcelDataUpdated(None).to_message()).unwrap();
        assert_eq!(message, json!({"event": "excel_data_updated", "data": null}));
    }

    #[test]
    fn test_cell_update_message() {
        let update = LiveUpdate::ExcelDataUpdated(Some(RecordChange::CapturaCellUpdate {
            id: 5,
            field: "CHOFER".into(),
            value: "Ana".into(),
        }));
        let message: Value = serde_json::from_str(&update.to_message()).unwrap();
        assert_eq!(
            message["data"],
            json!({"type": "captura_cell_update", "id": 5, "field": "CHOFER", "value": "Ana"})
        );
    }

    #[test]
    fn test_estatus_message() {
        let update = LiveUpdate::ExcelDataUpdated(Some(RecordChange::EstatusUpdate {
            id: 2,
            field: "ESTATUS2".into(),
            value: "LISTO".into(),
        }));
        assert_eq!(update.payload()["type"], "estatus_update");
    }

    #[test]
    fn test_nuevo_estatus_message() {
        let update = LiveUpdate::NuevoEstatusUpdated {
            last_updated: Some("2024-03-05T10:00:00.000Z".into()),
        };
        let message: Value = serde_json::from_str(&update.to_message()).unwrap();
        assert_eq!(message["event"], "nuevo_estatus_updated");
        assert_eq!(message["data"]["lastUpdated"], "2024-03-05T10:00:00.000Z");
    }
}
