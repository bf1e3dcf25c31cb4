/// Errors returned by dropout-rs operations.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// An estimator parameter failed validation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Two aligned inputs disagree on length or width.
    #[error("shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        /// What was being compared (e.g. "feature columns").
        context: &'static str,
        /// Size the operation required.
        expected: usize,
        /// Size that was supplied.
        found: usize,
    },

    /// Input data cannot be used for the requested computation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A cache entry could not be encoded or decoded.
    #[error("cache codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// A linear system could not be factorized or solved.
    #[error("linear algebra error: {0}")]
    Linalg(#[from] ndarray_linalg::error::LinalgError),

    /// The enrollment id file could not be parsed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    pub(crate) fn columns(expected: usize, found: usize) -> Self {
        ModelError::ShapeMismatch {
            context: "feature columns",
            expected,
            found,
        }
    }

    pub(crate) fn rows(expected: usize, found: usize) -> Self {
        ModelError::ShapeMismatch {
            context: "rows",
            expected,
            found,
        }
    }
}

