//! Reading SQL scripts from disk

use std::path::{Path, PathBuf};

use encoding_rs::WINDOWS_1252;

use crate::error::TransformError;

/// Read a script, trying UTF-8 first, then Windows-1252 as fallback.
///
/// A leading UTF-8 byte order mark is stripped.
pub fn read_script(path: &Path) -> Result<String, TransformError> {
    std::fs::read(path)
        .and_then(decode_script)
        .map_err(|source| TransformError::ScriptReadError {
            path: path.to_path_buf(),
            source,
        })
}

fn decode_script(bytes: Vec<u8>) -> std::io::Result<String> {
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            // Scripts saved by Windows tooling are often Windows-1252
            let bytes = e.into_bytes();
            let (decoded, _, had_errors) = WINDOWS_1252.decode(&bytes);
            if had_errors {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "File contains invalid characters",
                ));
            }
            decoded.into_owned()
        }
    };

    Ok(match text.strip_prefix('\u{FEFF}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/// Expand the given paths into script files.
///
/// Files are taken as given; directories are walked recursively for `*.sql`
/// files, which are returned sorted.
pub fn collect_script_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, TransformError> {
    let mut scripts = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            scripts.push(input.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in walkdir::WalkDir::new(input) {
            let entry = entry.map_err(|e| TransformError::ScriptReadError {
                path: e.path().map_or_else(|| input.clone(), Path::to_path_buf),
                source: e.into(),
            })?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
            {
                found.push(path.to_path_buf());
            }
        }
        found.sort();
        scripts.extend(found);
    }

    Ok(scripts)
}
