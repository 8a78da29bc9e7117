//! Fedveil Model Contracts
//!
//! The parameter-map data model consumed by the training core: tensors,
//! the ordered named-parameter map, gradient buffers, the `Trainable`
//! seam, checkpoint bundles, and a small linear reference model used by
//! tests and demos. Real model architectures live outside the core and
//! only need to satisfy these contracts.

mod checkpoint;
mod error;
mod gradient;
mod linear;
mod params;
mod tensor;
mod trainable;

pub use checkpoint::{Checkpoint, HyperParameters, Normalization};
pub use error::{ModelError, Result};
pub use gradient::GradientSet;
pub use linear::LinearRegressor;
pub use params::{Model, NamedParam};
pub use tensor::Tensor;
pub use trainable::{Batch, Trainable};
