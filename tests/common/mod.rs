//! Common test utilities for dml-backup tests

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tempfile::TempDir;

use dml_backup::{Dialect, Position, TransformOptions, TransformResult};

/// Test context with temporary directory for isolated file-based tests
pub struct TestContext {
    /// Kept to prevent temp directory cleanup until TestContext is dropped
    _temp_dir: TempDir,
    pub dir: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            dir,
        }
    }

    /// Write `content` to `relative` (parent directories are created)
    pub fn write_script(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create script directory");
        }
        fs::write(&path, content).expect("Failed to write script");
        path
    }
}

/// Expected outcome of one fixture, read from `expected.json`
#[derive(Debug, Deserialize)]
pub struct Expected {
    pub dialect: Dialect,
    #[serde(default)]
    pub backup_schema: Option<String>,
    /// Splitting the script is expected to fail
    #[serde(default)]
    pub malformed: bool,
    pub results: Vec<TransformResult>,
    #[serde(default)]
    pub failures: Vec<ExpectedFailure>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct ExpectedFailure {
    pub ordinal: usize,
    pub start: Position,
    pub end: Position,
    pub message: String,
}

/// One input script + expected results pair under `tests/fixtures/`
#[derive(Debug)]
pub struct Fixture {
    pub name: String,
    pub input: String,
    pub expected: Expected,
}

impl Fixture {
    pub fn options(&self) -> TransformOptions {
        let options = TransformOptions::new(self.expected.dialect);
        match &self.expected.backup_schema {
            Some(schema) => options.with_backup_schema(schema),
            None => options,
        }
    }
}

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Names of all fixtures, sorted
pub fn fixture_names() -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(fixtures_dir())
        .expect("Failed to read fixtures directory")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().join("expected.json").exists())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn load_fixture(name: &str) -> Fixture {
    let dir = fixtures_dir().join(name);
    let input = read(&dir.join("input.sql"));
    let expected = serde_json::from_str(&read(&dir.join("expected.json")))
        .unwrap_or_else(|e| panic!("Invalid expected.json for fixture '{}': {}", name, e));
    Fixture {
        name: name.to_string(),
        input,
        expected,
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

/// Text between two inclusive positions of `source`
pub fn text_at(source: &str, start: Position, end: Position) -> String {
    let lines: Vec<&str> = source.split('\n').collect();
    let mut out = String::new();
    for line_no in start.line..=end.line {
        let chars: Vec<char> = lines[line_no - 1].chars().collect();
        let from = if line_no == start.line { start.column } else { 0 };
        let to = if line_no == end.line {
            end.column + 1
        } else {
            chars.len()
        };
        out.extend(&chars[from..to]);
        if line_no != end.line {
            out.push('\n');
        }
    }
    out
}
