//! Secret sharing error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharingError {
    #[error("participant rosters differ: expected {expected:?}, got {got:?}")]
    ParticipantMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },

    #[error("no share held by participant {0}")]
    MissingShare(String),

    #[error("empty participant roster")]
    EmptyRoster,

    #[error("fixed-point error: {0}")]
    FixedPoint(#[from] fedveil_fixed_point::FixedPointError),
}

pub type Result<T> = std::result::Result<T, SharingError>;
