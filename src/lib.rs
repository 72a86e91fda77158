//! dml-backup: derive backup statements for destructive SQL
//!
//! This library turns every DELETE/UPDATE of a SQL script into a statement
//! that copies the rows it would touch into a uniquely named backup table,
//! and records where in the script each originating statement lives.

pub mod backup;
pub mod dialect;
pub mod error;
pub mod parser;
pub mod script_loader;

use std::path::{Path, PathBuf};

use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

pub use backup::{transform_script, NamingContext, TransformOutput, TransformResult};
pub use dialect::Dialect;
pub use error::{StatementFailure, TransformError};
pub use parser::Position;

/// Schema (or database) backup tables are created in unless overridden.
pub const DEFAULT_BACKUP_SCHEMA: &str = "backupSchema";

/// Minimum number of files to benefit from parallel processing.
const PARALLEL_THRESHOLD: usize = 8;

/// Options for transforming scripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    /// Dialect the scripts are written in
    pub dialect: Dialect,
    /// Schema (database for SQL Server) receiving the backup tables
    pub backup_schema: String,
}

impl TransformOptions {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            backup_schema: DEFAULT_BACKUP_SCHEMA.to_string(),
        }
    }

    /// Use a different backup schema; surrounding quotes are stripped.
    pub fn with_backup_schema(mut self, schema: &str) -> Self {
        self.backup_schema = parser::normalize_identifier(schema);
        self
    }
}

/// Transformation of one script file
#[derive(Debug, Clone, Serialize)]
pub struct FileTransform {
    pub path: PathBuf,
    #[serde(flatten)]
    pub output: TransformOutput,
}

/// Read and transform a single script file
pub fn transform_file(path: &Path, options: &TransformOptions) -> Result<FileTransform> {
    let script = script_loader::read_script(path)?;
    let output = transform_script(&script, options)?;

    info!(
        path = %path.display(),
        backups = output.results.len(),
        failures = output.failures.len(),
        "transformed script"
    );

    Ok(FileTransform {
        path: path.to_path_buf(),
        output,
    })
}

/// Transform multiple script files, using parallel processing for larger
/// file sets. Each file gets its own naming context; outputs keep the input
/// order.
pub fn transform_files(paths: &[PathBuf], options: &TransformOptions) -> Result<Vec<FileTransform>> {
    if paths.len() >= PARALLEL_THRESHOLD {
        paths
            .par_iter()
            .map(|path| transform_file(path, options))
            .collect()
    } else {
        paths
            .iter()
            .map(|path| transform_file(path, options))
            .collect()
    }
}
