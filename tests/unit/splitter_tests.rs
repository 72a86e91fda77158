//! Unit tests for script splitting

use dml_backup::parser::{split, Statement};
use dml_backup::{Dialect, Position, TransformError};

fn statements(sql: &str, dialect: Dialect) -> Vec<(String, Position, Position)> {
    split(sql, dialect)
        .unwrap()
        .iter()
        .map(|s: Statement<'_>| (s.text.to_string(), s.start, s.end))
        .collect()
}

// ============================================================================
// Terminators
// ============================================================================

#[test]
fn test_last_statement_needs_no_terminator() {
    let result = statements("DELETE FROM a;\nDELETE FROM b", Dialect::Postgres);
    assert_eq!(result.len(), 2);
    assert_eq!(result[1].0, "DELETE FROM b");
}

#[test]
fn test_terminator_in_quoted_identifier() {
    let result = statements("DELETE FROM `a;b` WHERE x = 1; DELETE FROM c", Dialect::MySql);
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].0, "DELETE FROM `a;b` WHERE x = 1");
}

#[test]
fn test_terminator_in_bracket_identifier() {
    let result = statements("DELETE FROM [a;b]; DELETE FROM c", Dialect::MsSql);
    assert_eq!(result[0].0, "DELETE FROM [a;b]");
}

#[test]
fn test_doubled_quote_inside_string() {
    let result = statements("UPDATE t SET a = 'it''s; fine'; DELETE FROM c", Dialect::Postgres);
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].0, "UPDATE t SET a = 'it''s; fine'");
}

#[test]
fn test_comment_only_script_has_no_statements() {
    assert!(statements("-- nothing here\n/* or here; */\n", Dialect::Oracle).is_empty());
}

#[test]
fn test_go_inside_comment_is_not_a_separator() {
    let sql = "DELETE FROM t /*\nGO\n*/ WHERE a = 1";
    assert_eq!(statements(sql, Dialect::MsSql).len(), 1);
}

// ============================================================================
// Positions
// ============================================================================

#[test]
fn test_positions_skip_leading_comments() {
    let sql = "-- header\n  /* note */ DELETE FROM t ;";
    let result = statements(sql, Dialect::Postgres);
    assert_eq!(result[0].0, "DELETE FROM t");
    assert_eq!(result[0].1, Position::new(2, 13));
    assert_eq!(result[0].2, Position::new(2, 25));
}

#[test]
fn test_positions_count_characters_not_bytes() {
    let sql = "UPDATE t SET a = 'ü' WHERE b = 'é';\nDELETE FROM t";
    let result = statements(sql, Dialect::Postgres);
    assert_eq!(result[0].2, Position::new(1, 33));
    assert_eq!(result[1].1, Position::new(2, 0));
}

#[test]
fn test_crlf_line_endings() {
    let sql = "DELETE FROM a;\r\nDELETE FROM b;\r\n";
    let result = statements(sql, Dialect::Postgres);
    assert_eq!(result[1].0, "DELETE FROM b");
    assert_eq!(result[1].1, Position::new(2, 0));
    assert_eq!(result[1].2, Position::new(2, 12));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_unterminated_block_comment() {
    let err = split("DELETE FROM t; /* open", Dialect::Postgres).unwrap_err();
    assert!(matches!(err, TransformError::MalformedScript { .. }));
}

#[test]
fn test_unterminated_quoted_identifier_reports_location() {
    let err = split("DELETE FROM t;\nDELETE FROM \"x", Dialect::Oracle).unwrap_err();
    match err {
        TransformError::MalformedScript { line, .. } => assert_eq!(line, 2),
        other => panic!("unexpected error: {other}"),
    }
}
