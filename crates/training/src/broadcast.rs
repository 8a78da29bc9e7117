//! Model distribution
//!
//! Installs the global model into every worker replica before local
//! training. A full value copy, not a merge: afterwards each replica is
//! element-for-element identical to the global model.

use fedveil_model::{Model, Trainable};

use crate::error::Result;
use crate::worker::Worker;

/// Overwrite every worker's replica with the global model's values.
///
/// Fails with `KeySetMismatch` / `ShapeMismatch` when any replica
/// disagrees with the global model's declared parameters; that is a
/// fatal configuration error.
pub fn broadcast<M: Trainable>(global: &Model, workers: &mut [Worker<M>]) -> Result<()> {
    for worker in workers.iter_mut() {
        worker.model_mut().params_mut().copy_values_from(global)?;
        tracing::debug!("replica synchronised for worker {}", worker.id());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedveil_model::{HyperParameters, LinearRegressor, ModelError};

    fn worker(seed: u64) -> Worker<LinearRegressor> {
        Worker::new(
            format!("w{seed}"),
            LinearRegressor::new(2, 1, seed).unwrap(),
            vec![],
            &HyperParameters::default(),
            seed,
        )
        .unwrap()
    }

    #[test]
    fn test_broadcast_overwrites_replicas() {
        let global = LinearRegressor::new(2, 1, 99).unwrap();
        let mut workers = vec![worker(1), worker(2)];

        broadcast(global.params(), &mut workers).unwrap();

        for w in &workers {
            assert_eq!(
                w.replica().param("weight").unwrap().data(),
                global.params().param("weight").unwrap().data()
            );
        }
    }

    #[test]
    fn test_incompatible_replica_is_fatal() {
        let global = LinearRegressor::new(3, 1, 0).unwrap();
        let mut workers = vec![worker(1)];

        let err = broadcast(global.params(), &mut workers).unwrap_err();
        assert!(matches!(
            err,
            crate::error::TrainingError::Model(ModelError::ShapeMismatch { .. })
        ));
    }
}
