//! JSON 单元格值转换

use serde_json::Value;

/// 单元格值转为写入数据库的文本（null → None）
///
/// 整数形式的浮点数不带小数部分，与表格导出的显示一致。
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(if let Some(i) = n.as_i64() {
            i.to_string()
        } else if let Some(u) = n.as_u64() {
            u.to_string()
        } else {
            n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string())
        }),
        other => Some(other.to_string()),
    }
}

/// 解析记录 ID
///
/// 接受正整数或以数字开头的字符串，其余（含 0）视为无效。
pub fn parse_record_id(value: &Value) -> Option<i32> {
    let id = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else {
                let f = n.as_f64()?;
                if f.fract() != 0.0 {
                    return None;
                }
                f as i64
            }
        }
        Value::String(s) => leading_integer(s)?,
        _ => return None,
    };

    i32::try_from(id).ok().filter(|id| *id > 0)
}

fn leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// 解析 ID 列表，任何一项无效则整体无效
pub fn parse_record_ids(value: &Value) -> Option<Vec<i32>> {
    value.as_array()?.iter().map(parse_record_id).collect()
}
