//! SQL 标识符引用
//!
//! 只用于来自白名单或系统目录的列名/表名，用户输入绝不能直接传入。

/// 用双引号引用标识符，内部双引号转义
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// 生成 `$1, $2, ...` 占位符列表
pub fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("PEDIDO"), "\"PEDIDO\"");
        assert_eq!(quote_ident("NOMBRE COMPAQ"), "\"NOMBRE COMPAQ\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(0), "");
        assert_eq!(placeholders(3), "$1, $2, $3");
    }
}
