//! Subsampled Gaussian RDP and conversion to (ε, δ)
//!
//! Per-step RDP follows Mironov's analysis of the sampled Gaussian
//! mechanism: α / (2σ²) for full-batch sampling (q = 1), and the
//! integer-order binomial expansion
//!
//!   A(α) = Σ_{k=0..α} C(α,k) (1-q)^(α-k) q^k exp((k² - k) / (2σ²))
//!   RDP(α) = ln A(α) / (α - 1)
//!
//! for q < 1, evaluated in log space. Composition over steps is linear
//! in the step count, which is what makes ε monotone in training length.

use crate::error::{AccountantError, Result};

/// Per-step RDP of the subsampled Gaussian mechanism at one order.
///
/// Inputs must already satisfy the constraints checked by
/// [`validate`]; this function is total on validated inputs.
pub fn compute_rdp(order: f64, sample_rate: f64, noise_multiplier: f64) -> f64 {
    let sigma_sq = noise_multiplier * noise_multiplier;

    if sample_rate >= 1.0 {
        return order / (2.0 * sigma_sq);
    }

    let alpha = order.round() as u64;
    let log_q = sample_rate.ln();
    let log_1mq = (-sample_rate).ln_1p();

    let mut log_binom = 0.0f64;
    let mut terms = Vec::with_capacity(alpha as usize + 1);
    for k in 0..=alpha {
        if k > 0 {
            log_binom += ((alpha - k + 1) as f64).ln() - (k as f64).ln();
        }
        let term = log_binom
            + k as f64 * log_q
            + (alpha - k) as f64 * log_1mq
            + (k * k - k) as f64 / (2.0 * sigma_sq);
        terms.push(term);
    }

    (log_sum_exp(&terms) / (order - 1.0)).max(0.0)
}

/// Accumulated privacy spend after `steps` noisy optimisation steps.
///
/// Every candidate order is composed over the step count and converted
/// with ε(α) = RDP·steps + ln(1/δ) / (α - 1); the minimum ε wins and is
/// returned together with the order that achieved it.
pub fn privacy_spent(
    target_delta: f64,
    steps: u64,
    orders: &[f64],
    sample_rate: f64,
    noise_multiplier: f64,
) -> Result<(f64, f64)> {
    validate(target_delta, orders, sample_rate, noise_multiplier)?;
    Ok(privacy_spent_unchecked(
        target_delta,
        steps,
        orders,
        sample_rate,
        noise_multiplier,
    ))
}

pub(crate) fn privacy_spent_unchecked(
    target_delta: f64,
    steps: u64,
    orders: &[f64],
    sample_rate: f64,
    noise_multiplier: f64,
) -> (f64, f64) {
    let log_inv_delta = (1.0 / target_delta).ln();

    let mut best_eps = f64::INFINITY;
    let mut best_order = orders[0];
    for &order in orders {
        let rdp = compute_rdp(order, sample_rate, noise_multiplier) * steps as f64;
        let eps = rdp + log_inv_delta / (order - 1.0);
        if eps < best_eps {
            best_eps = eps;
            best_order = order;
        }
    }
    (best_eps, best_order)
}

/// Check accountant parameters once, before any training starts.
pub(crate) fn validate(
    target_delta: f64,
    orders: &[f64],
    sample_rate: f64,
    noise_multiplier: f64,
) -> Result<()> {
    if !(target_delta > 0.0 && target_delta < 1.0) {
        return Err(AccountantError::InvalidDelta(target_delta));
    }
    if !(sample_rate > 0.0 && sample_rate <= 1.0) {
        return Err(AccountantError::InvalidSampleRate(sample_rate));
    }
    if !(noise_multiplier > 0.0) {
        return Err(AccountantError::InvalidNoiseMultiplier(noise_multiplier));
    }
    if orders.is_empty() {
        return Err(AccountantError::EmptyOrders);
    }
    for &order in orders {
        if !order.is_finite() || order <= 1.0 {
            return Err(AccountantError::OrderOutOfRange(order));
        }
        if sample_rate < 1.0 && order.fract() != 0.0 {
            return Err(AccountantError::FractionalOrder(order));
        }
    }
    Ok(())
}

fn log_sum_exp(terms: &[f64]) -> f64 {
    let max = terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    max + terms.iter().map(|&t| (t - max).exp()).sum::<f64>().ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_orders() -> Vec<f64> {
        (2..32).map(f64::from).collect()
    }

    #[test]
    fn test_full_batch_closed_form() {
        // q = 1: RDP(α) = α / (2σ²) exactly
        let rdp = compute_rdp(2.0, 1.0, 1.0);
        assert!((rdp - 1.0).abs() < 1e-12);

        let rdp = compute_rdp(8.0, 1.0, 0.5);
        assert!((rdp - 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_conversion_known_value() {
        // α = 2, σ = 1, q = 1, one step, δ = 0.1:
        // ε = 1 + ln(10) / 1 ≈ 3.3026
        let (eps, order) = privacy_spent(0.1, 1, &[2.0], 1.0, 1.0).unwrap();
        assert!((order - 2.0).abs() < 1e-12);
        assert!((eps - (1.0 + 10.0f64.ln())).abs() < 1e-9);
    }

    #[test]
    fn test_subsampling_amplifies_privacy() {
        // A small sampling rate must cost far less per step than full batch
        let full = compute_rdp(2.0, 1.0, 1.0);
        let sub = compute_rdp(2.0, 0.01, 1.0);
        assert!(sub < full / 10.0);
        assert!(sub > 0.0);
    }

    #[test]
    fn test_monotone_in_steps() {
        let orders = default_orders();
        let (eps_100, _) = privacy_spent(0.1, 100, &orders, 1.0, 0.1).unwrap();
        let (eps_200, _) = privacy_spent(0.1, 200, &orders, 1.0, 0.1).unwrap();
        assert!(eps_100.is_finite());
        assert!(eps_200 >= eps_100);
    }

    #[test]
    fn test_best_order_from_candidate_range() {
        let orders = default_orders();
        let (eps, best) = privacy_spent(0.1, 100, &orders, 1.0, 0.1).unwrap();
        assert!(eps.is_finite());
        assert!(orders.contains(&best));
    }

    #[test]
    fn test_empty_orders_rejected() {
        assert!(matches!(
            privacy_spent(0.1, 1, &[], 1.0, 1.0),
            Err(AccountantError::EmptyOrders)
        ));
    }

    #[test]
    fn test_degenerate_orders_rejected() {
        assert!(matches!(
            privacy_spent(0.1, 1, &[1.0], 1.0, 1.0),
            Err(AccountantError::OrderOutOfRange(_))
        ));
        assert!(matches!(
            privacy_spent(0.1, 1, &[0.5, 1.0], 1.0, 1.0),
            Err(AccountantError::OrderOutOfRange(_))
        ));
    }

    #[test]
    fn test_fractional_order_needs_full_batch() {
        // fine at q = 1
        assert!(privacy_spent(0.1, 1, &[2.5], 1.0, 1.0).is_ok());
        // rejected under subsampling
        assert!(matches!(
            privacy_spent(0.1, 1, &[2.5], 0.5, 1.0),
            Err(AccountantError::FractionalOrder(_))
        ));
    }

    #[test]
    fn test_invalid_scalars_rejected() {
        assert!(matches!(
            privacy_spent(0.0, 1, &[2.0], 1.0, 1.0),
            Err(AccountantError::InvalidDelta(_))
        ));
        assert!(matches!(
            privacy_spent(0.1, 1, &[2.0], 0.0, 1.0),
            Err(AccountantError::InvalidSampleRate(_))
        ));
        assert!(matches!(
            privacy_spent(0.1, 1, &[2.0], 1.0, 0.0),
            Err(AccountantError::InvalidNoiseMultiplier(_))
        ));
    }
}
