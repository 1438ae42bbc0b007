//! 日期规范化
//!
//! 表格上传的日期列可能是 Excel 序列号（数字或数字字符串），也可能是
//! `D/M/YYYY [H:M:S]` 形式的宽松文本。统一输出 `DD/MM/YYYY HH:MM:SS`，
//! 无法识别的值一律输出空字符串，不会报错。

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde_json::Value;

/// 需要规范化的日期列
pub const DATE_COLUMNS: [&str; 8] = [
    "FECHA_COTIZACION",
    "FECHA_PEDIDO",
    "PROMESA_DE_ENTREGA",
    "FECHA_CONFIRMACION_DE_PIEZA",
    "FECHA_CANCELACION_DE_PIEZA",
    "FECHA_FACTURACION_DE_PIEZA",
    "FECHA_ENTREGA_DE_PIEZA",
    "FECHA_RECEPCION_DE_PIEZA",
];

/// 1970-01-01 对应的 Excel 序列号
const UNIX_EPOCH_SERIAL: f64 = 25569.0;

/// 可表示时间点的毫秒上限（±100,000,000 天）
const MAX_TIME_MILLIS: f64 = 8.64e15;

/// 是否为日期列
pub fn is_date_column(column: &str) -> bool {
    DATE_COLUMNS.contains(&column)
}

/// Excel 序列号转换为 `DD/MM/YYYY HH:MM:SS`（UTC）
pub fn serial_to_canonical(serial: f64) -> String {
    if !serial.is_finite() {
        return String::new();
    }

    // 半数向上取整
    let millis = ((serial - UNIX_EPOCH_SERIAL) * 86400.0 * 1000.0 + 0.5).floor();
    if !(-MAX_TIME_MILLIS..=MAX_TIME_MILLIS).contains(&millis) {
        return String::new();
    }

    DateTime::<Utc>::from_timestamp_millis(millis as i64)
        .map(|instant| format_canonical(&instant))
        .unwrap_or_default()
}

fn format_canonical(instant: &DateTime<Utc>) -> String {
    format!(
        "{:02}/{:02}/{} {:02}:{:02}:{:02}",
        instant.day(),
        instant.month(),
        instant.year(),
        instant.hour(),
        instant.minute(),
        instant.second()
    )
}

/// 解析宽松的 `D/M/YYYY [H:M:S]` 文本
///
/// 日、月、年缺失或无法解析时返回空字符串；年份原样输出。
pub fn parse_loose_date(text: &str) -> String {
    parse_loose_parts(text).unwrap_or_default()
}

fn parse_loose_parts(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }

    let mut halves = text.split(' ');
    let date = halves.next().unwrap_or_default();
    let time = halves.next().unwrap_or("00:00:00");

    let mut date_parts = date.split('/');
    let day = non_empty(date_parts.next())?;
    let month = non_empty(date_parts.next())?;
    let year = non_empty(date_parts.next())?;

    let day = day.trim().parse::<u32>().ok()?;
    let month = month.trim().parse::<u32>().ok()?;
    if !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let mut time_parts = time.split(':');
    let hour = time_component(time_parts.next())?;
    let minute = time_component(time_parts.next())?;
    let second = time_component(time_parts.next())?;

    Some(format!(
        "{:02}/{:02}/{} {:02}:{:02}:{:02}",
        day, month, year, hour, minute, second
    ))
}

fn non_empty(part: Option<&str>) -> Option<&str> {
    part.filter(|p| !p.is_empty())
}

/// 时间分量缺失或为空时取 0
fn time_component(part: Option<&str>) -> Option<u32> {
    match part.map(str::trim) {
        None | Some("") => Some(0),
        Some(p) => p.parse().ok(),
    }
}

/// 按值的形态选择转换方式
///
/// 数字与数字字符串按序列号处理，其余非空字符串按宽松文本解析，
/// 其他一切（null、空串、布尔、对象）得到空字符串。
pub fn classify_and_normalize(value: &Value) -> String {
    match value {
        Value::Number(n) => n.as_f64().map(serial_to_canonical).unwrap_or_default(),
        Value::String(s) => match numeric_text(s) {
            Some(serial) => serial_to_canonical(serial),
            None => parse_loose_date(s),
        },
        _ => String::new(),
    }
}

pub use self::classify_and_normalize as normalize_date_field;

fn numeric_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serial_epoch() {
        assert_eq!(serial_to_canonical(25569.0), "01/01/1970 00:00:00");
    }

    #[test]
    fn test_serial_with_fraction() {
        assert_eq!(serial_to_canonical(45000.5), "15/03/2023 12:00:00");
        assert_eq!(serial_to_canonical(44927.75), "01/01/2023 18:00:00");
    }

    #[test]
    fn test_serial_before_epoch() {
        assert_eq!(serial_to_canonical(0.0), "30/12/1899 00:00:00");
    }

    #[test]
    fn test_serial_not_representable() {
        assert_eq!(serial_to_canonical(f64::NAN), "");
        assert_eq!(serial_to_canonical(f64::INFINITY), "");
        assert_eq!(serial_to_canonical(1e12), "");
    }

    #[test]
    fn test_loose_date_pads_components() {
        assert_eq!(parse_loose_date("5/3/2024"), "05/03/2024 00:00:00");
        assert_eq!(parse_loose_date("5/3/2024 7:4:9"), "05/03/2024 07:04:09");
        assert_eq!(parse_loose_date("15/11/2023 13:45"), "15/11/2023 13:45:00");
    }

    #[test]
    fn test_loose_date_keeps_year_verbatim() {
        assert_eq!(parse_loose_date("1/2/24"), "01/02/24 00:00:00");
    }

    #[test]
    fn test_loose_date_rejects_garbage() {
        assert_eq!(parse_loose_date(""), "");
        assert_eq!(parse_loose_date("garbage"), "");
        assert_eq!(parse_loose_date("5/3"), "");
        assert_eq!(parse_loose_date("a/3/2024"), "");
        assert_eq!(parse_loose_date("5/3/20x4"), "");
        assert_eq!(parse_loose_date("5/3/2024 aa:00"), "");
    }

    #[test]
    fn test_classify_numbers_and_numeric_text() {
        assert_eq!(classify_and_normalize(&json!(25569)), "01/01/1970 00:00:00");
        assert_eq!(classify_and_normalize(&json!("25569")), "01/01/1970 00:00:00");
        assert_eq!(classify_and_normalize(&json!(" 45000.5 ")), "15/03/2023 12:00:00");
    }

    #[test]
    fn test_classify_text_and_other_values() {
        assert_eq!(classify_and_normalize(&json!("5/3/2024")), "05/03/2024 00:00:00");
        assert_eq!(classify_and_normalize(&json!("")), "");
        assert_eq!(classify_and_normalize(&json!("   ")), "");
        assert_eq!(classify_and_normalize(&Value::Null), "");
        assert_eq!(classify_and_normalize(&json!(true)), "");
        assert_eq!(classify_and_normalize(&json!({"a": 1})), "");
    }

    #[test]
    fn test_date_columns() {
        assert!(is_date_column("FECHA_PEDIDO"));
        assert!(!is_date_column("PEDIDO"));
        assert_eq!(DATE_COLUMNS.len(), 8);
    }
}
