//! 基础数据记录（base_datos）

use serde_json::{Map, Value};
use std::collections::HashSet;

use super::dates::{DATE_COLUMNS, classify_and_normalize, is_date_column};
use super::values::value_to_text;

pub const BASE_RECORDS_TABLE: &str = "base_datos";
pub const NUEVO_ESTATUS_TABLE: &str = "nuevo_estatus";

/// base_datos 的业务列（不含 id）
pub const BASE_RECORD_COLUMNS: &[&str] = &[
    "PEDIDO",
    "OC",
    "FECHA_COTIZACION",
    "FECHA_PEDIDO",
    "PROMESA_DE_ENTREGA",
    "FECHA_CONFIRMACION_DE_PIEZA",
    "FECHA_CANCELACION_DE_PIEZA",
    "FECHA_FACTURACION_DE_PIEZA",
    "FECHA_ENTREGA_DE_PIEZA",
    "FECHA_RECEPCION_DE_PIEZA",
    "ESTATUS_LOCAL",
    "ESTATUS_FORANEO",
    "ESTATUS2",
    "LOCALIDAD",
    "CODIGO",
    "CHOFER",
    "COMPAQ",
];

/// 不允许为 null 的文本列，缺省为空字符串
pub const NOT_NULL_TEXT_COLUMNS: [&str; 2] = ["OC", "COMPAQ"];

/// nuevo_estatus 的业务列（不含 id）
pub const NUEVO_ESTATUS_COLUMNS: &[&str] = &[
    "PEDIDO",
    "FECHA_COTIZACION",
    "FECHA_PEDIDO",
    "PROMESA_DE_ENTREGA",
    "FECHA_CONFIRMACION_DE_PIEZA",
    "FECHA_CANCELACION_DE_PIEZA",
    "FECHA_FACTURACION_DE_PIEZA",
    "FECHA_ENTREGA_DE_PIEZA",
    "FECHA_RECEPCION_DE_PIEZA",
    "ESTATUS_LOCAL",
    "ESTATUS_FORANEO",
    "ESTATUS2",
    "LOCALIDAD",
];

/// COMPAQ 标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompaqStatus {
    Empty,
    Generar,
    Generado,
}

impl CompaqStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "",
            Self::Generar => "GENERAR",
            Self::Generado => "GENERADO",
        }
    }

    /// 宽松解析（忽略大小写与空白）
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_uppercase()).as_deref() {
            Some("GENERAR") => Self::Generar,
            Some("GENERADO") => Self::Generado,
            _ => Self::Empty,
        }
    }
}

/// 允许单独编辑的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditableField {
    Codigo,
    Chofer,
    EstatusLocal,
    EstatusForaneo,
    Estatus2,
    Localidad,
}

impl EditableField {
    const CAPTURA: [Self; 2] = [Self::Codigo, Self::Chofer];
    const ESTATUS: [Self; 4] = [
        Self::EstatusLocal,
        Self::EstatusForaneo,
        Self::Estatus2,
        Self::Localidad,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Self::Codigo => "CODIGO",
            Self::Chofer => "CHOFER",
            Self::EstatusLocal => "ESTATUS_LOCAL",
            Self::EstatusForaneo => "ESTATUS_FORANEO",
            Self::Estatus2 => "ESTATUS2",
            Self::Localidad => "LOCALIDAD",
        }
    }

    /// 采集界面可编辑的字段
    pub fn captura(name: &str) -> Option<Self> {
        Self::CAPTURA.into_iter().find(|f| f.column() == name)
    }

    /// 状态界面可编辑的字段
    pub fn estatus(name: &str) -> Option<Self> {
        Self::ESTATUS.into_iter().find(|f| f.column() == name)
    }

    /// 采集字段写入前去掉首尾空白，状态字段原样写入
    pub fn prepare_value(&self, value: &Value) -> String {
        let text = value_to_text(value).unwrap_or_default();
        if Self::CAPTURA.contains(self) {
            text.trim().to_string()
        } else {
            text
        }
    }
}

/// 待导入的一行
///
/// 列名只来自目标表的列集合，值全部以文本写入。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportRow {
    columns: Vec<String>,
    values: Vec<Option<String>>,
}

/// 构建导入行的结果
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRow {
    pub row: ImportRow,
    /// 目标表中不存在而被丢弃的列
    pub dropped: Vec<String>,
}

impl ImportRow {
    /// 从上传的 JSON 对象构建
    ///
    /// 丢弃 `id`；所有日期列（目标表存在时）都会写入规范化后的值，
    /// 即使上传的行里没有该列。
    pub fn prepare(source: &Map<String, Value>, table_columns: &HashSet<String>) -> PreparedRow {
        let mut row = ImportRow::default();
        let mut dropped = Vec::new();

        for (key, value) in source {
            if key == "id" || is_date_column(key) {
                continue;
            }
            if table_columns.contains(key) {
                let text = match value_to_text(value) {
                    None if NOT_NULL_TEXT_COLUMNS.contains(&key.as_str()) => Some(String::new()),
                    text => text,
                };
                row.push(key.clone(), text);
            } else {
                dropped.push(key.clone());
            }
        }

        for column in DATE_COLUMNS {
            if table_columns.contains(column) {
                let raw = source.get(column).unwrap_or(&Value::Null);
                row.push(column.to_string(), Some(classify_and_normalize(raw)));
            }
        }

        PreparedRow { row, dropped }
    }

    pub fn push(&mut self, column: String, value: Option<String>) {
        self.columns.push(column);
        self.values.push(value);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&Option<String>> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// 导入统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: u64,
    pub skipped: u64,
}

impl ImportSummary {
    pub fn record(&mut self, inserted: bool) {
        if inserted {
            self.inserted += 1;
        } else {
            self.skipped += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_columns() -> HashSet<String> {
        BASE_RECORD_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_compaq_status() {
        assert_eq!(CompaqStatus::parse(Some(" generar ")), CompaqStatus::Generar);
        assert_eq!(CompaqStatus::parse(Some("GENERADO")), CompaqStatus::Generado);
        assert_eq!(CompaqStatus::parse(None), CompaqStatus::Empty);
        assert_eq!(CompaqStatus::Generado.as_str(), "GENERADO");
    }

    #[test]
    fn test_editable_field_allow_lists() {
        assert_eq!(EditableField::captura("CODIGO"), Some(EditableField::Codigo));
        assert_eq!(EditableField::captura("ESTATUS2"), None);
        assert_eq!(EditableField::estatus("LOCALIDAD"), Some(EditableField::Localidad));
        assert_eq!(EditableField::estatus("CHOFER"), None);
        assert_eq!(EditableField::estatus("OC"), None);
        assert_eq!(EditableField::captura("codigo"), None);
    }

    #[test]
    fn test_prepare_value_trims_capture_fields_only() {
        assert_eq!(EditableField::Chofer.prepare_value(&json!("  Ana ")), "Ana");
        assert_eq!(EditableField::Codigo.prepare_value(&Value::Null), "");
        assert_eq!(EditableField::Estatus2.prepare_value(&json!(" EN RUTA ")), " EN RUTA ");
        assert_eq!(EditableField::Codigo.prepare_value(&json!(0)), "0");
    }

    #[test]
    fn test_prepare_row_drops_id_and_unknown_columns() {
        let source = json!({
            "id": 99,
            "PEDIDO": 100,
            "CLIENTE_DESCONOCIDO": "x",
            "FECHA_PEDIDO": 25569,
        });
        let prepared = ImportRow::prepare(source.as_object().unwrap(), &base_columns());

        assert_eq!(prepared.dropped, vec!["CLIENTE_DESCONOCIDO".to_string()]);
        assert!(prepared.row.get("id").is_none());
        assert_eq!(prepared.row.get("PEDIDO"), Some(&Some("100".to_string())));
        assert_eq!(
            prepared.row.get("FECHA_PEDIDO"),
            Some(&Some("01/01/1970 00:00:00".to_string()))
        );
    }

    #[test]
    fn test_prepare_row_turns_null_into_empty_for_not_null_columns() {
        let source = json!({"PEDIDO": null, "OC": null, "COMPAQ": null, "CHOFER": null});
        let prepared = ImportRow::prepare(source.as_object().unwrap(), &base_columns());

        assert_eq!(prepared.row.get("OC"), Some(&Some(String::new())));
        assert_eq!(prepared.row.get("COMPAQ"), Some(&Some(String::new())));
        assert_eq!(prepared.row.get("PEDIDO"), Some(&None));
        assert_eq!(prepared.row.get("CHOFER"), Some(&None));
    }

    #[test]
    fn test_prepare_row_sets_every_date_column() {
        let source = json!({"PEDIDO": "7"});
        let prepared = ImportRow::prepare(source.as_object().unwrap(), &base_columns());

        for column in DATE_COLUMNS {
            assert_eq!(prepared.row.get(column), Some(&Some(String::new())));
        }
        assert_eq!(prepared.row.len(), 1 + DATE_COLUMNS.len());
    }

    #[test]
    fn test_prepare_row_skips_dates_missing_from_table() {
        let columns: HashSet<String> = ["PEDIDO".to_string()].into_iter().collect();
        let source = json!({"PEDIDO": "7", "FECHA_PEDIDO": "1/1/2024"});
        let prepared = ImportRow::prepare(source.as_object().unwrap(), &columns);

        assert_eq!(prepared.row.columns(), &["PEDIDO".to_string()]);
        assert!(prepared.dropped.is_empty());
    }

    #[test]
    fn test_import_summary() {
        let mut summary = ImportSummary::default();
        summary.record(true);
        summary.record(true);
        summary.record(false);
        assert_eq!(summary, ImportSummary { inserted: 2, skipped: 1 });
    }
}
