//! SQL quoting utilities
//!
//! Safe quoting for identifiers and string literals when constructing the
//! small amount of dynamic SQL the engine and version managers need.

/// Quote a SQL identifier.
///
/// Wraps the identifier in double quotes and escapes embedded double quotes
/// by doubling them, following the SQL standard.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a SQL string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_simple() {
        assert_eq!(quote_ident("Settings"), r#""Settings""#);
    }

    #[test]
    fn test_quote_ident_with_embedded_quotes() {
        assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("C"), "'C'");
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
    }
}
