//! Unified error type for the GSA crates.
//!
//! [`GsaError`] covers the hard-fault surface of the toolkit: case lookup,
//! input validation, and configuration. Solver-level outcomes (convergence
//! failures, infeasible dispatch) deliberately do NOT appear here; they are
//! normalized into structured failure payloads at the runner boundary and
//! consumed as data, never raised.

use thiserror::Error;

/// Hard faults surfaced to callers of the GSA crates.
#[derive(Error, Debug)]
pub enum GsaError {
    /// I/O errors (report export, file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested benchmark case is not in the catalog
    #[error("unknown case `{name}` (available: {available})")]
    Catalog { name: String, available: String },

    /// Input data failed validation
    #[error("validation error: {0}")]
    Validation(String),

    /// Structural solver misuse (not a numerical outcome)
    #[error("solver error: {0}")]
    Solver(String),

    /// Bad option or argument combination
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience alias for Results using [`GsaError`].
pub type GsaResult<T> = Result<T, GsaError>;

impl From<anyhow::Error> for GsaError {
    fn from(err: anyhow::Error) -> Self {
        GsaError::Other(err.to_string())
    }
}

impl From<String> for GsaError {
    fn from(s: String) -> Self {
        GsaError::Other(s)
    }
}

impl From<&str> for GsaError {
    fn from(s: &str) -> Self {
        GsaError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_names_alternatives() {
        let err = GsaError::Catalog {
            name: "case99".into(),
            available: "case5, case9".into(),
        };
        let text = err.to_string();
        assert!(text.contains("case99"));
        assert!(text.contains("case5"));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> GsaResult<()> {
            Err(GsaError::Validation("test".into()))
        }

        fn outer() -> GsaResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
