//! 共享 SQL 片段

use po_adapter_postgres::{Savepoint, map_sqlx_error, placeholders, quote_ident};
use po_errors::AppResult;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashSet;
use tracing::warn;

use crate::domain::base_record::ImportRow;
use crate::domain::pedido::PEDIDO_WHITESPACE;

/// `PEDIDO_WHITESPACE` 在 E'' 字符串中的写法
fn sql_whitespace_chars() -> String {
    PEDIDO_WHITESPACE
        .iter()
        .map(|&c| match c {
            '\t' => "\\t".to_string(),
            '\r' => "\\r".to_string(),
            '\n' => "\\n".to_string(),
            other => other.to_string(),
        })
        .collect()
}

/// 与 `NormalizedPedido::normalize` 一致的 SQL 表达式
pub fn normalized_pedido_sql(column: &str) -> String {
    let ws = sql_whitespace_chars();
    format!(
        r"regexp_replace(LTRIM(COALESCE(CAST({column} AS TEXT), ''), E'{ws}'), E'([{ws}]|\\.0+)*$', '')"
    )
}

/// 按 id 倒序返回整行 JSON
pub fn select_rows_json_sql(table: &str, filter: Option<&str>) -> String {
    let table = quote_ident(table);
    match filter {
        Some(filter) => format!(
            "SELECT to_jsonb(t) FROM {} AS t WHERE {} ORDER BY t.id DESC",
            table, filter
        ),
        None => format!("SELECT to_jsonb(t) FROM {} AS t ORDER BY t.id DESC", table),
    }
}

const TABLE_COLUMNS_SQL: &str = r#"
    SELECT column_name::text
    FROM information_schema.columns
    WHERE table_schema = current_schema() AND table_name = $1
"#;

/// 表的列集合（不含 id）
pub async fn table_columns(
    tx: &mut Transaction<'static, Postgres>,
    table: &str,
) -> AppResult<HashSet<String>> {
    let columns: Vec<String> = sqlx::query_scalar(TABLE_COLUMNS_SQL)
        .bind(table)
        .fetch_all(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

    Ok(columns.into_iter().filter(|c| c != "id").collect())
}

/// 连接池上查询列集合
pub async fn pool_table_columns(pool: &PgPool, table: &str) -> AppResult<HashSet<String>> {
    let columns: Vec<String> = sqlx::query_scalar(TABLE_COLUMNS_SQL)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_error)?;

    Ok(columns.into_iter().filter(|c| c != "id").collect())
}

pub fn insert_row_sql(table: &str, row: &ImportRow) -> String {
    let columns = row
        .columns()
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        columns,
        placeholders(row.len())
    )
}

/// 在 savepoint 中插入一行；语句失败时回滚该行并返回 false
pub async fn insert_best_effort(
    tx: &mut Transaction<'static, Postgres>,
    table: &str,
    row: &ImportRow,
) -> AppResult<bool> {
    if row.is_empty() {
        return Ok(false);
    }

    let sql = insert_row_sql(table, row);
    let mut savepoint = Savepoint::new(tx, "import_row").await?;

    let mut query = sqlx::query(&sql);
    for value in row.values() {
        query = query.bind(value.as_deref());
    }

    match query.execute(&mut **savepoint.transaction()).await {
        Ok(_) => {
            savepoint.release().await?;
            Ok(true)
        }
        Err(e) => {
            warn!(table, error = %e, "Row skipped during import");
            savepoint.rollback().await?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_pedido_sql() {
        let sql = normalized_pedido_sql("b.\"PEDIDO\"");
        assert_eq!(
            sql,
            r#"regexp_replace(LTRIM(COALESCE(CAST(b."PEDIDO" AS TEXT), ''), E' \t\r\n'), E'([ \t\r\n]|\\.0+)*$', '')"#
        );
    }

    #[test]
    fn test_insert_row_sql_quotes_columns() {
        let mut row = ImportRow::default();
        row.push("PEDIDO".into(), Some("1".into()));
        row.push("NOMBRE COMPAQ".into(), None);

        assert_eq!(
            insert_row_sql("base_datos", &row),
            r#"INSERT INTO "base_datos" ("PEDIDO", "NOMBRE COMPAQ") VALUES ($1, $2)"#
        );
    }

    #[test]
    fn test_select_rows_json_sql() {
        assert_eq!(
            select_rows_json_sql("base_datos", None),
            r#"SELECT to_jsonb(t) FROM "base_datos" AS t ORDER BY t.id DESC"#
        );
        assert!(select_rows_json_sql("base_datos", Some("t.id > 0")).contains("WHERE t.id > 0"));
    }
}
