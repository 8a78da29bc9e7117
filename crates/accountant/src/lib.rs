//! Fedveil Privacy Accountant
//!
//! Rényi differential privacy (RDP) accounting for the subsampled
//! Gaussian mechanism. Each noisy optimisation step is tracked at a set
//! of Rényi orders; the accumulated RDP is converted to an (ε, δ)
//! guarantee on demand, reporting the order that gives the tightest ε.

mod error;
mod rdp;
mod state;

pub use error::{AccountantError, Result};
pub use rdp::{compute_rdp, privacy_spent};
pub use state::PrivacyState;
