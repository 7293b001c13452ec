//! Error types for mutant generation

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while generating mutants
#[derive(Debug, Error)]
pub enum MutationError {
    /// Configuration file is missing or malformed
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Operator name not in the catalog
    #[error("Unknown mutation operator '{name}'")]
    UnknownOperator { name: String },

    /// Configured domain contains tokens the operator cannot match
    #[error("Invalid domain for {operator}: {}", tokens.join(", "))]
    InvalidDomain { operator: String, tokens: Vec<String> },

    /// Configured range contains tokens the operator cannot produce
    #[error("Invalid range for {operator}: {}", tokens.join(", "))]
    InvalidRange { operator: String, tokens: Vec<String> },

    /// Output directory cannot be created or is not a directory
    #[error("Output directory '{}' is unusable: {error}", dir.display())]
    OutputDirectory { dir: PathBuf, error: String },

    /// Input file doesn't exist
    #[error("File not found: {}", file.display())]
    FileNotFound { file: PathBuf },

    /// Failed to read input file
    #[error("Failed to read file '{}': {error}", file.display())]
    FileReadError { file: PathBuf, error: String },

    /// Failed to write the database or a mutant file
    #[error("Failed to write '{}': {error}", file.display())]
    WriteError { file: PathBuf, error: String },

    /// Input file is not valid C
    #[error("{}:{line}:{column}: parse error: {message}", file.display())]
    Parse {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// Scope tracking fell out of step with the traversal
    #[error("Scope stack desynchronized at {line}:{column} while declaring '{name}'")]
    ScopeDesync {
        name: String,
        line: usize,
        column: usize,
    },

    /// Operator token that no operator family can classify
    #[error("Cannot classify operator token '{token}' for {operator}")]
    UnknownOpcode { operator: String, token: String },
}

/// Result type for mutant generation
pub type Result<T> = std::result::Result<T, MutationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = MutationError::InvalidDomain {
            operator: "OAAN".to_string(),
            tokens: vec!["&".to_string(), "|".to_string()],
        };
        assert_eq!(err.to_string(), "Invalid domain for OAAN: &, |");

        let err = MutationError::Parse {
            file: PathBuf::from("a.c"),
            line: 3,
            column: 7,
            message: "expected ';'".to_string(),
        };
        assert_eq!(err.to_string(), "a.c:3:7: parse error: expected ';'");
    }
}
