//! Secure aggregation protocol
//!
//! Folds worker replicas into a new global model. In secure mode every
//! per-parameter contribution is fixed-point encoded and split into
//! additive shares across the worker roster plus the crypto provider;
//! shares are summed locally and only the final total is revealed, so
//! the aggregation never handles a single worker's plaintext value.

use std::collections::HashMap;

use fedveil_fixed_point::FixedVector;
use fedveil_model::{Model, Tensor};
use fedveil_sharing::{CryptoProvider, ShareSet};

use crate::error::{Result, TrainingError};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Explicit protocol state for one training run: the ordered worker
/// registry, the crypto provider handle and the fixed-point precision
/// every share in a round must use.
pub struct AggregationContext {
    worker_ids: Vec<String>,
    provider: CryptoProvider,
    precision: u8,
}

impl AggregationContext {
    /// Declare the participant set and protocol parameters.
    pub fn new(
        worker_ids: Vec<String>,
        provider: CryptoProvider,
        precision: u8,
    ) -> Result<Self> {
        if worker_ids.is_empty() {
            return Err(TrainingError::NoWorkers);
        }
        for (i, id) in worker_ids.iter().enumerate() {
            if worker_ids[..i].contains(id) {
                return Err(TrainingError::DuplicateWorker(id.clone()));
            }
        }
        Ok(Self {
            worker_ids,
            provider,
            precision,
        })
    }

    /// The declared worker registry, in order.
    pub fn worker_ids(&self) -> &[String] {
        &self.worker_ids
    }

    /// Fractional bits used for every share of a round.
    pub fn precision(&self) -> u8 {
        self.precision
    }
}

/// Aggregate worker replicas into a fresh model.
///
/// Iterates the global model's declared key order; non-aggregable
/// tracking counters are carried through from the global model. With
/// `weights` the already-weighted sum is taken as-is (weights must
/// cover exactly the participating workers and sum to 1); without, the
/// plain mean is used. Any key-set or shape disagreement aborts the
/// whole round before a single parameter is folded, leaving the caller's
/// global model untouched.
pub fn aggregate(
    global: &Model,
    replicas: &HashMap<String, &Model>,
    ctx: &mut AggregationContext,
    weights: Option<&HashMap<String, f64>>,
    secure: bool,
) -> Result<Model> {
    for id in replicas.keys() {
        if !ctx.worker_ids.contains(id) {
            return Err(TrainingError::UnknownWorker(id.clone()));
        }
    }
    // Round roster: registry order, restricted to workers that
    // contributed a replica (survivors under DropFailed).
    let roster: Vec<String> = ctx
        .worker_ids
        .iter()
        .filter(|id| replicas.contains_key(*id))
        .cloned()
        .collect();
    if roster.is_empty() {
        return Err(TrainingError::NoWorkers);
    }

    if let Some(w) = weights {
        validate_weights(w, &roster)?;
    }

    // Validate everything up front: no partial apply on failure.
    for id in &roster {
        global.check_compatible(replicas[id])?;
    }

    let mut fresh = Model::new();
    for param in global.iter() {
        if !param.aggregate {
            fresh.push_counter(param.name.clone(), param.tensor.clone())?;
            continue;
        }

        let contributions = roster.iter().map(|id| -> Result<Vec<f64>> {
            let values = replicas[id].param(&param.name)?.data();
            Ok(match weights.and_then(|w| w.get(id)) {
                Some(&wi) => values.iter().map(|v| v * wi).collect(),
                None => values.to_vec(),
            })
        });

        let mut summed = if secure {
            secure_sum(ctx, &roster, contributions)?
        } else {
            plain_sum(param.tensor.len(), contributions)?
        };

        if weights.is_none() {
            let n = roster.len() as f64;
            summed.iter_mut().for_each(|v| *v /= n);
        }

        fresh.push(
            param.name.clone(),
            Tensor::from_vec(summed, param.tensor.shape().to_vec())?,
        )?;
    }

    tracing::debug!(
        "aggregated {} parameters from {} workers (secure = {})",
        fresh.len(),
        roster.len(),
        secure
    );
    Ok(fresh)
}

/// Plaintext unweighted averaging for trusted or simulated settings.
pub fn plain_average(
    global: &Model,
    replicas: &HashMap<String, &Model>,
    ctx: &mut AggregationContext,
) -> Result<Model> {
    aggregate(global, replicas, ctx, None, false)
}

/// Share-split every contribution, sum share-wise, reveal only the total.
/// The intermediate share sets drop (and zeroize) before this returns.
fn secure_sum(
    ctx: &mut AggregationContext,
    roster: &[String],
    contributions: impl Iterator<Item = Result<Vec<f64>>>,
) -> Result<Vec<f64>> {
    let mut total: Option<ShareSet> = None;
    for values in contributions {
        let values = values?;
        let encoded = FixedVector::from_f64_slice(&values, ctx.precision)?;
        let shares = ctx.provider.deal(&encoded, roster)?;
        total = Some(match total {
            Some(sum) => sum.wrapping_add(&shares)?,
            None => shares,
        });
    }

    let total = total.ok_or(TrainingError::NoWorkers)?;
    let revealed = total.reconstruct()?;
    Ok(revealed.to_f64_vec())
}

fn plain_sum(
    len: usize,
    contributions: impl Iterator<Item = Result<Vec<f64>>>,
) -> Result<Vec<f64>> {
    let mut sum = vec![0.0; len];
    for values in contributions {
        for (acc, v) in sum.iter_mut().zip(values?) {
            *acc += v;
        }
    }
    Ok(sum)
}

fn validate_weights(weights: &HashMap<String, f64>, roster: &[String]) -> Result<()> {
    let mut sum = 0.0;
    for id in roster {
        let w = weights.get(id).ok_or_else(|| {
            TrainingError::InvalidWeights(format!("no weight for worker {id}"))
        })?;
        if !w.is_finite() || *w < 0.0 {
            return Err(TrainingError::InvalidWeights(format!(
                "weight {w} for worker {id} is not a finite non-negative value"
            )));
        }
        sum += w;
    }
    if weights.len() != roster.len() {
        return Err(TrainingError::InvalidWeights(
            "weights supplied for workers outside the round roster".to_string(),
        ));
    }
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(TrainingError::InvalidWeights(format!(
            "weights sum to {sum}, expected 1"
        )));
    }
    Ok(())
}
