//! Fedveil demo
//!
//! Two simulated workers train a shared linear model on synthetic data
//! with DP local steps and secure aggregation, then the run is bundled
//! into a checkpoint.
//!
//! Run with: cargo run -p fedveil-training --bin demo

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Normal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fedveil_model::{Batch, HyperParameters, LinearRegressor, Normalization, Tensor, Trainable};
use fedveil_sharing::CryptoProvider;
use fedveil_training::{Orchestrator, TrainingConfig, Worker, WorkerFailurePolicy};

const IN_DIM: usize = 4;
const OUT_DIM: usize = 1;
const BATCHES_PER_WORKER: usize = 16;

/// Batches drawn from y = w*·x + noise, one sample per batch as in the
/// DP accounting contract.
fn synthetic_batches(count: usize, seed: u64) -> Vec<Batch> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let feature = Normal::new(0.0, 1.0).expect("statically valid std");
    let label_noise = Normal::new(0.0, 0.05).expect("statically valid std");
    let true_w = [0.5, -0.25, 1.0, 0.75];

    (0..count)
        .map(|_| {
            let x: Vec<f64> = (0..IN_DIM).map(|_| feature.sample(&mut rng)).collect();
            let y: f64 = x.iter().zip(true_w).map(|(xi, wi)| xi * wi).sum::<f64>()
                + label_noise.sample(&mut rng);
            Batch {
                inputs: Tensor::from_vec(x, vec![1, IN_DIM]).expect("matching shape"),
                targets: Tensor::from_vec(vec![y], vec![1, OUT_DIM]).expect("matching shape"),
            }
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fedveil_training=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let hyper = HyperParameters {
        epochs: 5,
        ..HyperParameters::default()
    };
    tracing::info!(
        "starting federated run: {} epochs, clip {}, noise multiplier {}",
        hyper.epochs,
        hyper.clip_norm,
        hyper.noise_multiplier
    );

    let global = LinearRegressor::new(IN_DIM, OUT_DIM, 7)?;
    let workers = vec![
        Worker::new(
            "alice",
            LinearRegressor::new(IN_DIM, OUT_DIM, 1)?,
            synthetic_batches(BATCHES_PER_WORKER, 11),
            &hyper,
            101,
        )?,
        Worker::new(
            "bob",
            LinearRegressor::new(IN_DIM, OUT_DIM, 2)?,
            synthetic_batches(BATCHES_PER_WORKER, 22),
            &hyper,
            202,
        )?,
    ];

    let config = TrainingConfig {
        hyper,
        secure: true,
        failure_policy: WorkerFailurePolicy::AbortRound,
    };
    let mut orchestrator = Orchestrator::new(
        global.params().clone(),
        workers,
        CryptoProvider::new("crypto_provider"),
        config,
    )?;

    let reports = orchestrator.train()?;
    for report in &reports {
        let mean_loss: f64 = report.workers.iter().map(|w| w.epoch_loss).sum::<f64>()
            / report.workers.len() as f64;
        tracing::info!("epoch {} done: mean loss {:.4}", report.epoch, mean_loss);
    }

    let checkpoint = orchestrator.into_checkpoint(Some(Normalization {
        mean: vec![0.0; IN_DIM],
        std: vec![1.0; IN_DIM],
    }));
    let path = std::env::temp_dir().join("fedveil_demo_checkpoint.json");
    checkpoint.save(&path)?;
    tracing::info!("checkpoint written to {}", path.display());

    Ok(())
}
