//! Error types for dml-backup

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::parser::Position;

/// A statement that looked like DML but could not be turned into a backup.
///
/// Failures are collected per statement; they never stop the rest of the
/// script from being transformed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("statement #{ordinal} ({start}-{end}) cannot be backed up: {message}")]
pub struct StatementFailure {
    /// 1-based ordinal of the statement within the script
    pub ordinal: usize,
    pub start: Position,
    pub end: Position,
    pub message: String,
}

/// Errors that can occur while transforming a script
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Malformed script at line {line}, column {column}: {message}")]
    MalformedScript {
        line: usize,
        column: usize,
        message: String,
    },

    #[error(transparent)]
    ParseFailure(#[from] StatementFailure),

    #[error("Unknown dialect: {tag} (expected one of postgres, mysql, tidb, mssql, oracle)")]
    UnknownDialect { tag: String },

    #[error("Failed to read SQL script: {path}")]
    ScriptReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
