//! 订单号（PEDIDO）规范化
//!
//! 同一订单号在不同表格里可能写成 `"100"`、`"100.00"` 或 `" 100 "`，
//! 比较前去掉开头的空白，再反复去掉末尾的空白与 `.0+`，直到不再变化。
//! 空白只包括空格、制表符、回车与换行。
//! SQL 侧的同名表达式见 `normalized_pedido_sql`，两边使用同一组空白字符。

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use super::values::value_to_text;

/// 参与首尾裁剪的空白字符
pub const PEDIDO_WHITESPACE: [char; 4] = [' ', '\t', '\r', '\n'];

/// 规范化后的订单号
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedPedido(String);

impl NormalizedPedido {
    /// 规范化任意文本
    pub fn normalize(raw: &str) -> Self {
        let mut rest = raw.trim_start_matches(PEDIDO_WHITESPACE);
        // "1.0.00" -> "1.0" -> "1"
        loop {
            let trimmed = rest.trim_end_matches(PEDIDO_WHITESPACE);
            match strip_zero_fraction(trimmed) {
                Some(shorter) => rest = shorter,
                None => {
                    rest = trimmed;
                    break;
                }
            }
        }
        Self(rest.to_string())
    }

    /// 规范化 JSON 值（null 视为空）
    pub fn from_value(value: &Value) -> Self {
        Self::normalize(value_to_text(value).as_deref().unwrap_or_default())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedPedido {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 末尾为 `.` 加至少一个 `0` 时去掉这一段
fn strip_zero_fraction(text: &str) -> Option<&str> {
    let dot = text.rfind('.')?;
    let tail = &text[dot + 1..];
    (!tail.is_empty() && tail.bytes().all(|b| b == b'0')).then(|| &text[..dot])
}

/// 规范化订单号文本
pub fn normalize_pedido(raw: &str) -> String {
    NormalizedPedido::normalize(raw).into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equivalent_spellings() {
        let plain = NormalizedPedido::normalize("100");
        assert_eq!(NormalizedPedido::normalize("100.00"), plain);
        assert_eq!(NormalizedPedido::normalize(" 100 "), plain);
        assert_eq!(NormalizedPedido::normalize("100.0 "), plain);
    }

    #[test]
    fn test_only_trailing_zero_fraction_is_stripped() {
        assert_eq!(normalize_pedido("100.5"), "100.5");
        assert_eq!(normalize_pedido("100.50"), "100.50");
        assert_eq!(normalize_pedido("100."), "100.");
        assert_eq!(normalize_pedido("1.0.00"), "1");
        assert_eq!(normalize_pedido("1.5.00"), "1.5");
        assert_eq!(normalize_pedido(" 5 .0"), "5");
        assert_eq!(normalize_pedido("A-7.000"), "A-7");
    }

    #[test]
    fn test_from_value() {
        assert_eq!(NormalizedPedido::from_value(&json!(100)).as_str(), "100");
        assert_eq!(NormalizedPedido::from_value(&json!(100.0)).as_str(), "100");
        assert_eq!(NormalizedPedido::from_value(&json!(" 42.0")).as_str(), "42");
        assert!(NormalizedPedido::from_value(&Value::Null).is_empty());
        assert!(NormalizedPedido::from_value(&json!("   ")).is_empty());
    }

    #[test]
    fn test_only_ascii_whitespace_is_trimmed() {
        assert_eq!(normalize_pedido("\t100\r\n"), "100");
        assert_eq!(normalize_pedido("100\u{a0}"), "100\u{a0}");
        assert_eq!(normalize_pedido("\u{b}100"), "\u{b}100");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["100.00", " 7 ", "X.0", "12.30", "1.0.00", "2.00.0.000", " 5 .0", "9.0 \t"] {
            let once = normalize_pedido(raw);
            assert_eq!(normalize_pedido(&once), once);
        }
    }
}
