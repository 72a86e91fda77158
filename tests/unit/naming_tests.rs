//! Unit tests for backup naming, quoting and statement synthesis

use pretty_assertions::assert_eq;

use dml_backup::backup::synthesize;
use dml_backup::parser::{analyze, Analysis};
use dml_backup::{Dialect, NamingContext, Position, TransformOptions};

#[test]
fn test_naming_context_restarts_per_script() {
    let mut first = NamingContext::new(Dialect::Postgres, "backupSchema");
    first.next_index();
    first.next_index();
    let mut second = NamingContext::new(Dialect::Postgres, "backupSchema");
    assert_eq!(second.next_index(), 0);
}

#[test]
fn test_with_backup_schema_strips_quotes() {
    assert_eq!(
        TransformOptions::new(Dialect::MsSql)
            .with_backup_schema("[archive]")
            .backup_schema,
        "archive"
    );
    assert_eq!(TransformOptions::new(Dialect::MySql).backup_schema, "backupSchema");
}

#[test]
fn test_backup_schema_with_embedded_quote() {
    let ctx = NamingContext::new(Dialect::Postgres, "odd\"name");
    assert_eq!(ctx.quoted_backup_schema(), "\"odd\"\"name\"");
}

#[test]
fn test_synthesize_keeps_original_span() {
    let Analysis::Dml(descriptor) = analyze("DELETE FROM t", Dialect::Postgres).unwrap() else {
        panic!("expected DML");
    };
    let mut naming = NamingContext::new(Dialect::Postgres, "backupSchema");
    let result = synthesize(
        &descriptor,
        Position::new(7, 4),
        Position::new(9, 2),
        &mut naming,
    );
    assert_eq!(result.start_position, Position::new(7, 4));
    assert_eq!(result.end_position, Position::new(9, 2));
    assert_eq!(naming.issued(), 1);
}

#[test]
fn test_synthesize_with_joined_auxiliaries() {
    let Analysis::Dml(descriptor) = analyze(
        "UPDATE t SET a = 1 FROM u JOIN v ON u.id = v.id WHERE t.id = u.id",
        Dialect::Postgres,
    )
    .unwrap() else {
        panic!("expected DML");
    };
    let mut naming = NamingContext::new(Dialect::Postgres, "backupSchema");
    let result = synthesize(&descriptor, Position::new(1, 0), Position::new(1, 0), &mut naming);
    assert_eq!(
        result.statement,
        "CREATE TABLE \"backupSchema\".\"rollback_0_t\" AS SELECT \"t\".* FROM t, u JOIN v ON u.id = v.id WHERE t.id = u.id;"
    );
}
