//! Table-driven tests over the script corpus in `tests/fixtures/`
//!
//! Each fixture directory holds an `input.sql` script and an `expected.json`
//! file with the dialect, the expected backup statements and any statements
//! expected to fail.

use pretty_assertions::assert_eq;

use dml_backup::parser::split;
use dml_backup::{transform_script, TransformError};

use crate::common::{fixture_names, load_fixture, text_at, ExpectedFailure};

#[test]
fn test_fixture_corpus_is_present() {
    assert!(
        fixture_names().len() >= 5,
        "Expected fixture corpus under tests/fixtures, found {:?}",
        fixture_names()
    );
}

#[test]
fn test_all_fixtures() {
    for name in fixture_names() {
        let fixture = load_fixture(&name);
        let outcome = transform_script(&fixture.input, &fixture.options());

        if fixture.expected.malformed {
            assert!(
                matches!(outcome, Err(TransformError::MalformedScript { .. })),
                "Fixture '{}' should be malformed, got {:?}",
                fixture.name,
                outcome
            );
            continue;
        }

        let output = outcome
            .unwrap_or_else(|e| panic!("Fixture '{}' failed to transform: {}", fixture.name, e));
        assert_eq!(
            output.results, fixture.expected.results,
            "results of fixture '{}'",
            fixture.name
        );

        let failures: Vec<ExpectedFailure> = output
            .failures
            .into_iter()
            .map(|f| ExpectedFailure {
                ordinal: f.ordinal,
                start: f.start,
                end: f.end,
                message: f.message,
            })
            .collect();
        assert_eq!(
            failures, fixture.expected.failures,
            "failures of fixture '{}'",
            fixture.name
        );
    }
}

#[test]
fn test_transform_is_idempotent() {
    for name in fixture_names() {
        let fixture = load_fixture(&name);
        if fixture.expected.malformed {
            continue;
        }
        let first = transform_script(&fixture.input, &fixture.options()).unwrap();
        let second = transform_script(&fixture.input, &fixture.options()).unwrap();
        assert_eq!(first, second, "fixture '{}'", fixture.name);
    }
}

#[test]
fn test_spans_reproduce_original_statements() {
    for name in fixture_names() {
        let fixture = load_fixture(&name);
        if fixture.expected.malformed {
            continue;
        }
        let script = split(&fixture.input, fixture.expected.dialect).unwrap();
        let output = transform_script(&fixture.input, &fixture.options()).unwrap();

        for result in &output.results {
            let text = text_at(&fixture.input, result.start_position, result.end_position);
            let statement = script
                .iter()
                .find(|s| s.start == result.start_position)
                .unwrap_or_else(|| panic!("No statement starts at {}", result.start_position));
            assert_eq!(text, statement.text, "fixture '{}'", fixture.name);
            assert_eq!(statement.end, result.end_position);
        }
    }
}

#[test]
fn test_indices_are_contiguous_in_script_order() {
    for name in fixture_names() {
        let fixture = load_fixture(&name);
        if fixture.expected.malformed {
            continue;
        }
        let output = transform_script(&fixture.input, &fixture.options()).unwrap();
        for (index, result) in output.results.iter().enumerate() {
            let expected = format!("rollback_{}_{}", index, result.source_table_name);
            assert_eq!(result.target_table_name, expected, "fixture '{}'", fixture.name);
        }
        let starts: Vec<_> = output.results.iter().map(|r| r.start_position).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted, "fixture '{}'", fixture.name);
    }
}
