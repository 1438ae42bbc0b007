//! 供应商订单（ordenes_proveedor）

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::pedido::NormalizedPedido;
use super::values::value_to_text;

pub const SUPPLIER_ORDERS_TABLE: &str = "ordenes_proveedor";

/// 已保存的供应商订单
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplierOrder {
    pub id: i32,
    #[serde(rename = "PEDIDO")]
    pub pedido: String,
    #[serde(rename = "ORDEN_PROVEEDOR")]
    pub orden_proveedor: String,
}

/// 上传的供应商订单行
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SupplierOrderInput {
    #[serde(rename = "PEDIDO", default)]
    pub pedido: Value,
    #[serde(rename = "ORDEN_PROVEEDOR", default)]
    pub orden_proveedor: Value,
}

/// 校验通过、可写入的供应商订单
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSupplierOrder {
    pub pedido: NormalizedPedido,
    pub orden_proveedor: String,
}

impl SupplierOrderInput {
    pub fn new(pedido: impl Into<Value>, orden_proveedor: impl Into<Value>) -> Self {
        Self {
            pedido: pedido.into(),
            orden_proveedor: orden_proveedor.into(),
        }
    }

    /// 订单号规范化后为空或供应商单号为空时返回 None
    pub fn validate(&self) -> Option<ValidSupplierOrder> {
        let pedido = NormalizedPedido::from_value(&self.pedido);
        let orden_proveedor = value_to_text(&self.orden_proveedor)
            .map(|code| code.trim().to_string())
            .unwrap_or_default();

        if pedido.is_empty() || orden_proveedor.is_empty() {
            return None;
        }

        Some(ValidSupplierOrder {
            pedido,
            orden_proveedor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_normalizes_both_fields() {
        let valid = SupplierOrderInput::new("100.0 ", " SP-1 ").validate().unwrap();
        assert_eq!(valid.pedido.as_str(), "100");
        assert_eq!(valid.orden_proveedor, "SP-1");
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        assert!(SupplierOrderInput::new("  ", "SP-1").validate().is_none());
        assert!(SupplierOrderInput::new("100", "   ").validate().is_none());
        assert!(SupplierOrderInput::default().validate().is_none());
    }

    #[test]
    fn test_numeric_cells() {
        let input: SupplierOrderInput =
            serde_json::from_value(json!({"PEDIDO": 200.0, "ORDEN_PROVEEDOR": 5531})).unwrap();
        let valid = input.validate().unwrap();
        assert_eq!(valid.pedido.as_str(), "200");
        assert_eq!(valid.orden_proveedor, "5531");
    }

    #[test]
    fn test_serialize_uses_column_names() {
        let order = SupplierOrder {
            id: 1,
            pedido: "100".into(),
            orden_proveedor: "SP-1".into(),
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json, json!({"id": 1, "PEDIDO": "100", "ORDEN_PROVEEDOR": "SP-1"}));
    }
}
