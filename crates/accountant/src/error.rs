//! Accountant error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccountantError {
    #[error("no Rényi orders supplied")]
    EmptyOrders,

    #[error("Rényi order {0} must be greater than 1")]
    OrderOutOfRange(f64),

    #[error("non-integer Rényi order {0} is unsupported when the sample rate is below 1")]
    FractionalOrder(f64),

    #[error("target delta {0} must lie in (0, 1)")]
    InvalidDelta(f64),

    #[error("sample rate {0} must lie in (0, 1]")]
    InvalidSampleRate(f64),

    #[error("noise multiplier {0} must be positive")]
    InvalidNoiseMultiplier(f64),
}

pub type Result<T> = std::result::Result<T, AccountantError>;
