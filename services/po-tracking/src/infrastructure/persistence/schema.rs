//! 建表迁移

use po_adapter_postgres::{Migration, quote_ident};

use crate::domain::base_record::{
    BASE_RECORD_COLUMNS, BASE_RECORDS_TABLE, NOT_NULL_TEXT_COLUMNS, NUEVO_ESTATUS_COLUMNS,
    NUEVO_ESTATUS_TABLE,
};

/// OC 与 COMPAQ 默认空字符串，其余文本列可为空
fn text_table_sql(table: &str, columns: &[&str]) -> String {
    let mut definitions = vec!["id SERIAL PRIMARY KEY".to_string()];
    for column in columns {
        let default = if NOT_NULL_TEXT_COLUMNS.contains(column) {
            " NOT NULL DEFAULT ''"
        } else {
            ""
        };
        definitions.push(format!("{} TEXT{}", quote_ident(column), default));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
        quote_ident(table),
        definitions.join(",\n    ")
    )
}

const SUPPLIER_ORDERS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS ordenes_proveedor (
    id SERIAL PRIMARY KEY,
    "PEDIDO" TEXT NOT NULL,
    "ORDEN_PROVEEDOR" TEXT NOT NULL
);
"#;

const USERS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS usuarios (
    id SERIAL PRIMARY KEY,
    usuario TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    rol TEXT NOT NULL
);
"#;

const LOCALIDADES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS localidades (
    id SERIAL PRIMARY KEY,
    taller TEXT NOT NULL,
    localidad TEXT NOT NULL,
    "CODIGO" TEXT,
    "NOMBRE COMPAQ" TEXT,
    "NOMENCLATURA" TEXT,
    UNIQUE (taller, localidad)
);
"#;

/// 按版本排序的迁移列表
pub fn migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "create_base_datos",
            text_table_sql(BASE_RECORDS_TABLE, BASE_RECORD_COLUMNS),
        ),
        Migration::new(2, "create_ordenes_proveedor", SUPPLIER_ORDERS_SQL),
        Migration::new(
            3,
            "create_nuevo_estatus",
            text_table_sql(NUEVO_ESTATUS_TABLE, NUEVO_ESTATUS_COLUMNS),
        ),
        Migration::new(4, "create_usuarios", USERS_SQL),
        Migration::new(5, "create_localidades", LOCALIDADES_SQL),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_ascending_and_unique() {
        let versions: Vec<i64> = migrations().iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(versions, sorted);
    }

    #[test]
    fn test_base_table_definition() {
        let sql = text_table_sql("base_datos", &["PEDIDO", "OC"]);
        assert!(sql.starts_with(r#"CREATE TABLE IF NOT EXISTS "base_datos""#));
        assert!(sql.contains(r#""PEDIDO" TEXT,"#));
        assert!(sql.contains(r#""OC" TEXT NOT NULL DEFAULT ''"#));
    }

    #[test]
    fn test_checksums_are_stable() {
        let first: Vec<String> = migrations().into_iter().map(|m| m.checksum).collect();
        let second: Vec<String> = migrations().into_iter().map(|m| m.checksum).collect();
        assert_eq!(first, second);
    }
}
