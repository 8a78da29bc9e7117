//! Checkpoint bundles
//!
//! A persisted checkpoint carries the parameter map, the hyperparameter
//! configuration that produced it, and optionally the input
//! normalization statistics, so evaluation tooling can rebuild an
//! identical model.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::params::Model;

/// Training hyperparameters, persisted alongside the parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HyperParameters {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub clip_norm: f64,
    pub noise_multiplier: f64,
    /// Fractional bits of the secure-aggregation encoding
    pub precision: u8,
    /// Candidate Rényi orders tracked by the accountant
    pub orders: Vec<f64>,
    pub target_delta: f64,
    pub sample_rate: f64,
}

impl Default for HyperParameters {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 1,
            learning_rate: 1e-3,
            clip_norm: 1.3,
            noise_multiplier: 0.1,
            precision: 16,
            orders: (2..32).map(f64::from).collect(),
            target_delta: 0.1,
            sample_rate: 1.0,
        }
    }
}

/// Per-channel input normalization statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Normalization {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

/// The persisted training bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub params: Model,
    pub hyperparameters: HyperParameters,
    pub normalization: Option<Normalization>,
}

impl Checkpoint {
    /// Write the bundle as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a bundle back from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
