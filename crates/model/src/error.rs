//! Model error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("shape mismatch for {name}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("parameter key sets differ: expected {expected:?}, got {got:?}")]
    KeySetMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },

    #[error("duplicate parameter {0}")]
    DuplicateParameter(String),

    #[error("unknown parameter {0}")]
    UnknownParameter(String),

    #[error("{elements} elements do not fill shape {shape:?}")]
    InvalidShape { elements: usize, shape: Vec<usize> },

    #[error("checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checkpoint serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
