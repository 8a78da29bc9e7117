//! Crypto provider
//!
//! The distinguished participant that deals the randomness for share
//! splits. It holds the balancing share of every value it deals and owns
//! no model parameters; the uniform worker shares it hands out carry no
//! information individually.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use fedveil_fixed_point::FixedVector;

use crate::error::{Result, SharingError};
use crate::set::ShareSet;
use crate::share::Share;

/// Dealer of correlated randomness for additive splits.
pub struct CryptoProvider {
    id: String,
    rng: ChaCha20Rng,
}

impl CryptoProvider {
    /// Provider seeded from OS entropy
    pub fn new(id: impl Into<String>) -> Self {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        Self {
            id: id.into(),
            rng: ChaCha20Rng::from_seed(seed),
        }
    }

    /// Provider with a fixed seed (reproducible protocol runs and tests)
    pub fn with_seed(id: impl Into<String>, seed: u64) -> Self {
        Self {
            id: id.into(),
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// The provider's participant id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Split a value across the workers plus the provider itself: each
    /// worker receives a uniformly random share, the provider keeps the
    /// balancing share. The roster of the returned set is
    /// `workers ++ [provider]`, in declared order.
    pub fn deal(&mut self, plaintext: &FixedVector, workers: &[String]) -> Result<ShareSet> {
        if workers.is_empty() {
            return Err(SharingError::EmptyRoster);
        }

        let mut shares: Vec<Share> = workers
            .iter()
            .map(|_| Share::random_with_rng(plaintext.len(), plaintext.precision, &mut self.rng))
            .collect();
        shares.push(Share::balancing(plaintext, &shares));

        let mut holders = workers.to_vec();
        holders.push(self.id.clone());

        Ok(ShareSet::new(holders, shares))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_holds_balancing_share() {
        let mut provider = CryptoProvider::with_seed("crypto_provider", 11);
        let workers = vec!["alice".to_string(), "bob".to_string()];
        let v = FixedVector::from_f64_slice_default(&[5.0, -1.0]).unwrap();

        let set = provider.deal(&v, &workers).unwrap();
        assert_eq!(set.holders().last().map(String::as_str), Some("crypto_provider"));

        // worker shares + provider share reconstruct the value exactly
        let alice = set.share_of("alice").unwrap().clone();
        let bob = set.share_of("bob").unwrap().clone();
        let own = set.share_of("crypto_provider").unwrap().clone();
        let sum = alice.wrapping_add(&bob).wrapping_add(&own);
        assert_eq!(sum.data, v.data);
    }

    #[test]
    fn test_empty_roster_rejected() {
        let mut provider = CryptoProvider::with_seed("crypto_provider", 12);
        let v = FixedVector::from_f64_slice_default(&[1.0]).unwrap();
        assert!(matches!(
            provider.deal(&v, &[]),
            Err(SharingError::EmptyRoster)
        ));
    }

    #[test]
    fn test_deals_are_fresh() {
        // The same value dealt twice must not produce the same worker shares
        let mut provider = CryptoProvider::with_seed("crypto_provider", 13);
        let workers = vec!["alice".to_string()];
        let v = FixedVector::from_f64_slice_default(&[3.0]).unwrap();

        let a = provider.deal(&v, &workers).unwrap();
        let b = provider.deal(&v, &workers).unwrap();
        assert_ne!(
            a.share_of("alice").unwrap().data,
            b.share_of("alice").unwrap().data
        );
    }
}
