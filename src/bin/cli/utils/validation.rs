//! Input validation utilities for CLI commands

use std::path::Path;

use crate::cli::utils::{CliError, CliResult};

/// The database path must be a directory or not exist yet
pub fn validate_db_path(path: &str) -> CliResult<()> {
    if path.is_empty() {
        return Err(CliError::Validation("database path cannot be empty".into()));
    }
    let p = Path::new(path);
    if p.exists() && !p.is_dir() {
        return Err(CliError::Validation(format!(
            "database path is not a directory: {}",
            path
        )));
    }
    Ok(())
}

/// A batch input must be an existing regular file
pub fn validate_batch_file(path: &str) -> CliResult<()> {
    let p = Path::new(path);
    if !p.exists() {
        return Err(CliError::Validation(format!("batch file not found: {}", path)));
    }
    if !p.is_file() {
        return Err(CliError::Validation(format!("batch input is not a file: {}", path)));
    }
    Ok(())
}
