//! Console summary tables

use prettytable::{format, Cell, Row, Table};

/// Format a compact table with headers and rows using prettytable-rs clean
/// format, indented two spaces.
pub fn format_compact_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);

    table.add_row(Row::new(headers.iter().map(|h| Cell::new(h)).collect()));
    for row in rows {
        table.add_row(Row::new(row.iter().map(|c| Cell::new(c)).collect()));
    }

    let mut result = String::new();
    for line in table.to_string().lines() {
        result.push_str("  ");
        result.push_str(line);
        result.push('\n');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_compact_table() {
        let rows = vec![
            vec!["1. Exercise 1".to_string(), "12".to_string()],
            vec!["2. Exercise 2".to_string(), "9".to_string()],
        ];
        let output = format_compact_table(&["Question", "Answered"], &rows);
        assert!(output.contains("Question"));
        assert!(output.contains("1. Exercise 1"));
        assert!(output.lines().all(|line| line.starts_with("  ")));
    }

    #[test]
    fn test_empty_rows_yield_empty_output() {
        assert_eq!(format_compact_table(&["a"], &[]), "");
    }
}
