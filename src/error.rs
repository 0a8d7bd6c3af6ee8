//! Fatal startup conditions.
//!
//! These abort the run before any item is processed. Each maps to its own
//! process exit code so wrapper scripts can tell them apart.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FatalError {
    #[error("Could not find RAW array in data file")]
    MarkerNotFound,

    #[error("Item #{position} is missing required field '{key}'")]
    MissingField { key: &'static str, position: usize },

    #[error("Item #{position} has an invalid field: {message}")]
    InvalidRecord { position: usize, message: String },

    #[error("JSON parse error at line {line}, pos {offset}:\n  {message}\n  Context: ...{context}...")]
    MalformedJson {
        line: usize,
        offset: usize,
        message: String,
        context: String,
    },

    #[error("{var} environment variable is required.\nSet it with: export {var}=sk-...")]
    MissingCredential { var: String },
}

impl FatalError {
    /// Process exit status for this condition.
    pub fn exit_code(&self) -> i32 {
        match self {
            FatalError::MarkerNotFound => 2,
            FatalError::MissingField { .. } | FatalError::InvalidRecord { .. } => 3,
            FatalError::MalformedJson { .. } => 4,
            FatalError::MissingCredential { .. } => 5,
        }
    }
}

/// Exit status for command-line usage errors (`EX_USAGE`). Kept apart from
/// every [`FatalError`] code.
pub const USAGE_EXIT_CODE: i32 = 64;

/// Exit status for an error that bubbled up to `main`.
///
/// Walks the `anyhow` chain so a [`FatalError`] wrapped in context still
/// keeps its own code; anything else exits with 1.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<FatalError>())
        .map(FatalError::exit_code)
        .unwrap_or(1)
}
