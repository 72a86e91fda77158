//! File-based transformation tests

use pretty_assertions::assert_eq;

use dml_backup::script_loader::{collect_script_paths, read_script};
use dml_backup::{transform_file, transform_files, Dialect, TransformError, TransformOptions};

use crate::common::TestContext;

// ============================================================================
// Script loading
// ============================================================================

#[test]
fn test_read_script_strips_bom() {
    let ctx = TestContext::new();
    let path = ctx.write_script("bom.sql", b"\xEF\xBB\xBFDELETE FROM t WHERE c1 = 1;");

    let script = read_script(&path).unwrap();
    assert_eq!(script, "DELETE FROM t WHERE c1 = 1;");
}

#[test]
fn test_read_script_windows_1252() {
    let ctx = TestContext::new();
    let path = ctx.write_script("cp1252.sql", b"DELETE FROM t WHERE name = 'Jos\xE9';");

    let options = TransformOptions::new(Dialect::MsSql);
    let transform = transform_file(&path, &options).unwrap();
    assert_eq!(
        transform.output.results[0].statement,
        "SELECT [t].* INTO [backupSchema].[dbo].[rollback_0_t] FROM t WHERE name = 'José';"
    );
}

#[test]
fn test_missing_file_is_read_error() {
    let ctx = TestContext::new();
    let err = read_script(&ctx.dir.join("missing.sql")).unwrap_err();
    assert!(matches!(err, TransformError::ScriptReadError { .. }));
}

#[test]
fn test_collect_script_paths_walks_directories() {
    let ctx = TestContext::new();
    ctx.write_script("b.sql", "DELETE FROM b;");
    ctx.write_script("a.sql", "DELETE FROM a;");
    ctx.write_script("nested/c.SQL", "DELETE FROM c;");
    ctx.write_script("notes.txt", "not sql");
    let explicit = ctx.write_script("other/explicit.txt", "DELETE FROM d;");

    let paths = collect_script_paths(&[ctx.dir.clone(), explicit.clone()]).unwrap();
    assert_eq!(
        paths,
        vec![
            ctx.dir.join("a.sql"),
            ctx.dir.join("b.sql"),
            ctx.dir.join("nested/c.SQL"),
            explicit,
        ]
    );
}

// ============================================================================
// Transformation
// ============================================================================

#[test]
fn test_transform_files_uses_one_naming_context_per_file() {
    let ctx = TestContext::new();
    let paths: Vec<_> = (0..10)
        .map(|i| {
            ctx.write_script(
                &format!("script_{i:02}.sql"),
                format!("DELETE FROM t{i} WHERE id = 1;\nUPDATE t{i} SET a = 1;\n"),
            )
        })
        .collect();

    let options = TransformOptions::new(Dialect::Postgres).with_backup_schema("\"bak\"");
    let transforms = transform_files(&paths, &options).unwrap();

    assert_eq!(transforms.len(), paths.len());
    for (i, transform) in transforms.iter().enumerate() {
        assert_eq!(transform.path, paths[i]);
        let names: Vec<_> = transform
            .output
            .results
            .iter()
            .map(|r| r.target_table_name.clone())
            .collect();
        assert_eq!(names, vec![format!("rollback_0_t{i}"), format!("rollback_1_t{i}")]);
        assert!(transform.output.results[0]
            .statement
            .starts_with("CREATE TABLE \"bak\"."));
    }
}

#[test]
fn test_transform_files_propagates_malformed_script() {
    let ctx = TestContext::new();
    let good = ctx.write_script("good.sql", "DELETE FROM t;");
    let bad = ctx.write_script("bad.sql", "DELETE FROM t WHERE a = \"open;");

    let err = transform_files(&[good, bad], &TransformOptions::new(Dialect::Postgres)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TransformError>(),
        Some(TransformError::MalformedScript { .. })
    ));
}

#[test]
fn test_file_transform_json_shape() {
    let ctx = TestContext::new();
    let path = ctx.write_script("one.sql", "DELETE FROM t WHERE c1 = 1;\nUPDATE t;\n");

    let transform = transform_file(&path, &TransformOptions::new(Dialect::Postgres)).unwrap();
    let json = serde_json::to_value(&transform).unwrap();

    assert_eq!(json["results"][0]["target_table_name"], "rollback_0_t");
    assert_eq!(json["results"][0]["start_position"]["line"], 1);
    assert_eq!(json["results"][0]["end_position"]["column"], 25);
    assert_eq!(json["failures"][0]["ordinal"], 2);
    assert_eq!(
        json["failures"][0]["message"],
        "expected SET after the UPDATE target"
    );
    assert!(json["path"].as_str().unwrap().ends_with("one.sql"));
}
