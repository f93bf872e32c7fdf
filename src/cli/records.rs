//! Secret records on disk.
//!
//! Records are JSON documents. `-` stands for stdin when reading and stdout
//! when writing; a path that does not exist reads as an absent record.

use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};

use super::output::{print_output, OutputFormat};
use crate::domain::Secret;

const STDIO: &str = "-";

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == STDIO
}

/// Read a record, returning `None` when the file does not exist.
pub fn read_record(path: &Path) -> Result<Option<Secret>> {
    let contents = if is_stdio(path) {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("Failed to read record from stdin")?;
        buf
    } else {
        match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        }
    };

    if contents.trim().is_empty() {
        return Ok(None);
    }

    let secret = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse record {}", path.display()))?;
    Ok(Some(secret))
}

/// Read a record that must exist.
pub fn require_record(path: &Path) -> Result<Secret> {
    read_record(path)?.with_context(|| format!("Record {} does not exist", path.display()))
}

/// Write a record as JSON, or print it in `format` when `path` is `-`.
pub fn write_record(path: &Path, secret: &Secret, format: OutputFormat) -> Result<()> {
    if is_stdio(path) {
        return print_output(secret, format);
    }

    let json = serde_json::to_string_pretty(secret).context("Failed to serialize record")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
