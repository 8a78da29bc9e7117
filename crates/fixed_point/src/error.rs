//! Fixed-point error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixedPointError {
    #[error("value {value} outside the representable range at precision {precision}")]
    Overflow { value: f64, precision: u8 },

    #[error("precision mismatch: expected {expected}, got {got}")]
    PrecisionMismatch { expected: u8, got: u8 },

    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("invalid precision: {0} (must be 0-30)")]
    InvalidPrecision(u8),
}

pub type Result<T> = std::result::Result<T, FixedPointError>;
