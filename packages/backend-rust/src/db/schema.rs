pub const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

pub const SCHEMA_VERSION: &str = "2";

pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut prev = '\0';

    for ch in sql.chars() {
        match ch {
            '\'' if !in_double_quote && prev != '\\' => {
                in_single_quote = !in_single_quote;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
            }
            ';' if !in_single_quote && !in_double_quote => {
                let stmt = current.trim();
                if !stmt.is_empty() {
                    statements.push(stmt.to_string());
                }
                current.clear();
                prev = ch;
                continue;
            }
            _ => {}
        }

        current.push(ch);
        prev = ch;
    }

    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }

    statements
}

/// Drop `--` comment lines; `None` when nothing executable is left.
pub fn strip_comment_lines(statement: &str) -> Option<String> {
    let sql = statement
        .lines()
        .filter(|line| !line.trim().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_ignores_quoted_semicolons() {
        let sql = "INSERT INTO t VALUES ('a;b');\nSELECT \"x;y\" FROM t;";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], "INSERT INTO t VALUES ('a;b')");
    }

    #[test]
    fn test_schema_has_every_table() {
        let statements: Vec<String> = split_sql_statements(SCHEMA_SQL)
            .iter()
            .filter_map(|stmt| strip_comment_lines(stmt))
            .collect();
        for table in ["\"dictionaries\"", "\"words\"", "\"mastery_records\"", "\"_db_metadata\""] {
            assert!(
                statements
                    .iter()
                    .any(|stmt| stmt.starts_with("CREATE TABLE") && stmt.contains(table)),
                "missing table {table}"
            );
        }
    }

    #[test]
    fn test_comment_only_statement_is_dropped() {
        assert_eq!(strip_comment_lines("-- just a note\n  -- another"), None);
        assert_eq!(
            strip_comment_lines("-- header\nSELECT 1").as_deref(),
            Some("SELECT 1")
        );
    }
}
