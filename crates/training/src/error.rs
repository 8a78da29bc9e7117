//! Training error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("model error: {0}")]
    Model(#[from] fedveil_model::ModelError),

    #[error("sharing error: {0}")]
    Sharing(#[from] fedveil_sharing::SharingError),

    #[error("fixed-point error: {0}")]
    FixedPoint(#[from] fedveil_fixed_point::FixedPointError),

    #[error("invalid accountant configuration: {0}")]
    InvalidAccountantConfig(#[from] fedveil_accountant::AccountantError),

    #[error("numeric instability: {0}")]
    NumericInstability(String),

    #[error("invalid aggregation weights: {0}")]
    InvalidWeights(String),

    #[error("worker {0} is not in the declared registry")]
    UnknownWorker(String),

    #[error("worker {0} is declared twice in the registry")]
    DuplicateWorker(String),

    #[error("no workers available for the round")]
    NoWorkers,

    #[error("worker {id} failed local training: {source}")]
    WorkerFailed {
        id: String,
        #[source]
        source: Box<TrainingError>,
    },
}

pub type Result<T> = std::result::Result<T, TrainingError>;
