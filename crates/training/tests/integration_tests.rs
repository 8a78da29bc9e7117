//! End-to-end tests for the federated round
//!
//! Exercises the full broadcast → DP local training → secure aggregation
//! cycle with real workers, and checks the protocol-level properties the
//! components must uphold together.

use std::collections::HashMap;

use fedveil_fixed_point::resolution;
use fedveil_model::{
    Batch, Checkpoint, HyperParameters, LinearRegressor, Model, Tensor, Trainable,
};
use fedveil_sharing::CryptoProvider;
use fedveil_training::{
    aggregate, AggregationContext, Orchestrator, TrainingConfig, TrainingError, Worker,
    WorkerFailurePolicy,
};

const IN_DIM: usize = 3;

fn batch(x: [f64; IN_DIM], y: f64) -> Batch {
    Batch {
        inputs: Tensor::from_vec(x.to_vec(), vec![1, IN_DIM]).unwrap(),
        targets: Tensor::from_vec(vec![y], vec![1, 1]).unwrap(),
    }
}

fn dataset(seed: u64) -> Vec<Batch> {
    // Deterministic points on y = x0 + 2·x1 - x2
    (0..6)
        .map(|i| {
            let t = (i as f64 + seed as f64) * 0.37;
            let x = [t.sin(), t.cos(), (t * 0.5).sin()];
            batch(x, x[0] + 2.0 * x[1] - x[2])
        })
        .collect()
}

fn build_orchestrator(
    hyper: HyperParameters,
    secure: bool,
    policy: WorkerFailurePolicy,
) -> Orchestrator<LinearRegressor> {
    let global = LinearRegressor::new(IN_DIM, 1, 500).unwrap();
    let workers = vec![
        Worker::new(
            "alice",
            LinearRegressor::new(IN_DIM, 1, 1).unwrap(),
            dataset(1),
            &hyper,
            11,
        )
        .unwrap(),
        Worker::new(
            "bob",
            LinearRegressor::new(IN_DIM, 1, 2).unwrap(),
            dataset(2),
            &hyper,
            22,
        )
        .unwrap(),
    ];
    Orchestrator::new(
        global.params().clone(),
        workers,
        CryptoProvider::with_seed("crypto_provider", 77),
        TrainingConfig {
            hyper,
            secure,
            failure_policy: policy,
        },
    )
    .unwrap()
}

#[test]
fn full_federated_run_tracks_privacy() {
    let hyper = HyperParameters {
        epochs: 3,
        ..HyperParameters::default()
    };
    let mut orch = build_orchestrator(hyper, true, WorkerFailurePolicy::AbortRound);

    let reports = orch.train().unwrap();
    assert_eq!(reports.len(), 3);

    // Every worker took one step per batch per epoch
    let last = &reports[2];
    for w in &last.workers {
        assert_eq!(w.steps, 18); // 6 batches × 3 epochs
        assert!(w.epsilon.is_finite());
        assert!(w.best_order > 1.0);
    }

    // ε never decreases across rounds for either worker
    for worker_idx in 0..2 {
        let spends: Vec<f64> = reports
            .iter()
            .map(|r| r.workers[worker_idx].epsilon)
            .collect();
        assert!(spends.windows(2).all(|w| w[0] <= w[1]));
    }
}

#[test]
fn secure_and_plaintext_runs_agree_without_noise() {
    // With the noise multiplier driven to ~0 and identical seeds, a
    // secure run and a plaintext run produce the same global model up
    // to the fixed-point encoding bound.
    let hyper = HyperParameters {
        epochs: 2,
        noise_multiplier: 1e-12,
        ..HyperParameters::default()
    };

    let mut secure_run = build_orchestrator(hyper.clone(), true, WorkerFailurePolicy::AbortRound);
    let mut plain_run = build_orchestrator(hyper, false, WorkerFailurePolicy::AbortRound);

    secure_run.train().unwrap();
    plain_run.train().unwrap();

    let s = secure_run.global().param("weight").unwrap().data();
    let p = plain_run.global().param("weight").unwrap().data();
    // Two rounds of encoding error across two workers
    let bound = resolution(16) * 8.0;
    for (a, b) in s.iter().zip(p) {
        assert!((a - b).abs() < bound, "secure {a} vs plaintext {b}");
    }
}

#[test]
fn replicas_diverge_from_global_after_round() {
    let hyper = HyperParameters::default();
    let mut orch = build_orchestrator(hyper, true, WorkerFailurePolicy::AbortRound);

    // One round mutates replicas; afterwards their weights differ from
    // the aggregated global model until the next broadcast
    orch.run_round(0).unwrap();

    let global_weight = orch.global().param("weight").unwrap().data().to_vec();
    let noisy_replica = orch.workers()[0].replica().param("weight").unwrap().data();
    assert_ne!(global_weight, noisy_replica);
}

#[test]
fn aggregation_mean_matches_hand_computation() {
    let mut global = Model::new();
    global.push("w", Tensor::zeros(vec![2])).unwrap();

    let mut a = Model::new();
    a.push("w", Tensor::from_vec(vec![1.0, -3.0], vec![2]).unwrap())
        .unwrap();
    let mut b = Model::new();
    b.push("w", Tensor::from_vec(vec![2.0, 5.0], vec![2]).unwrap())
        .unwrap();

    let replicas: HashMap<String, &Model> =
        HashMap::from([("a".to_string(), &a), ("b".to_string(), &b)]);
    let mut ctx = AggregationContext::new(
        vec!["a".to_string(), "b".to_string()],
        CryptoProvider::with_seed("crypto_provider", 5),
        16,
    )
    .unwrap();

    let fresh = aggregate(&global, &replicas, &mut ctx, None, true).unwrap();
    let got = fresh.param("w").unwrap().data();
    assert!((got[0] - 1.5).abs() < resolution(16) * 2.0);
    assert!((got[1] - 1.0).abs() < resolution(16) * 2.0);
}

#[test]
fn weighted_aggregation_requires_normalised_weights() {
    let mut global = Model::new();
    global.push("w", Tensor::zeros(vec![1])).unwrap();
    let mut a = Model::new();
    a.push("w", Tensor::scalar(10.0)).unwrap();
    let mut b = Model::new();
    b.push("w", Tensor::scalar(20.0)).unwrap();

    let replicas: HashMap<String, &Model> =
        HashMap::from([("a".to_string(), &a), ("b".to_string(), &b)]);
    let mut ctx = AggregationContext::new(
        vec!["a".to_string(), "b".to_string()],
        CryptoProvider::with_seed("crypto_provider", 6),
        16,
    )
    .unwrap();

    let good = HashMap::from([("a".to_string(), 0.3), ("b".to_string(), 0.7)]);
    let fresh = aggregate(&global, &replicas, &mut ctx, Some(&good), true).unwrap();
    let got = fresh.param("w").unwrap().data()[0];
    assert!((got - 17.0).abs() < resolution(16) * 2.0);

    let bad = HashMap::from([("a".to_string(), 0.3), ("b".to_string(), 0.3)]);
    assert!(matches!(
        aggregate(&global, &replicas, &mut ctx, Some(&bad), true),
        Err(TrainingError::InvalidWeights(_))
    ));
}

#[test]
fn failed_worker_aborts_or_is_dropped_by_policy() {
    let poison = Batch {
        inputs: Tensor::from_vec(vec![f64::NAN; IN_DIM], vec![1, IN_DIM]).unwrap(),
        targets: Tensor::from_vec(vec![0.0], vec![1, 1]).unwrap(),
    };
    let hyper = HyperParameters::default();

    let build = |policy| {
        let global = LinearRegressor::new(IN_DIM, 1, 500).unwrap();
        let workers = vec![
            Worker::new(
                "healthy",
                LinearRegressor::new(IN_DIM, 1, 1).unwrap(),
                dataset(1),
                &hyper,
                1,
            )
            .unwrap(),
            Worker::new(
                "broken",
                LinearRegressor::new(IN_DIM, 1, 2).unwrap(),
                vec![poison.clone()],
                &hyper,
                2,
            )
            .unwrap(),
        ];
        Orchestrator::new(
            global.params().clone(),
            workers,
            CryptoProvider::with_seed("crypto_provider", 3),
            TrainingConfig {
                hyper: hyper.clone(),
                secure: true,
                failure_policy: policy,
            },
        )
        .unwrap()
    };

    let mut aborting = build(WorkerFailurePolicy::AbortRound);
    let err = aborting.run_round(0).unwrap_err();
    match err {
        TrainingError::WorkerFailed { id, source } => {
            assert_eq!(id, "broken");
            assert!(matches!(*source, TrainingError::NumericInstability(_)));
        }
        other => panic!("expected WorkerFailed, got {other}"),
    }

    let mut dropping = build(WorkerFailurePolicy::DropFailed);
    let report = dropping.run_round(0).unwrap();
    assert_eq!(report.workers.len(), 1);
    assert_eq!(report.workers[0].worker_id, "healthy");
    assert_eq!(report.dropped, vec!["broken".to_string()]);
}

#[test]
fn checkpoint_roundtrip_preserves_run_state() {
    let hyper = HyperParameters {
        epochs: 1,
        ..HyperParameters::default()
    };
    let mut orch = build_orchestrator(hyper, true, WorkerFailurePolicy::AbortRound);
    orch.train().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    let checkpoint = orch.into_checkpoint(None);
    checkpoint.save(&path).unwrap();

    let restored = Checkpoint::load(&path).unwrap();
    assert!(checkpoint.params.check_compatible(&restored.params).is_ok());
    assert_eq!(
        restored.params.param("weight").unwrap().data(),
        checkpoint.params.param("weight").unwrap().data()
    );
    assert_eq!(restored.hyperparameters.epochs, 1);
}
