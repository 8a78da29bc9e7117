//! Share sets across a participant roster
//!
//! A `ShareSet` is the complete set of shares of one value, one per
//! declared participant. Addition is share-wise and local; a value can
//! only be revealed when every participant's share is combined, which is
//! what keeps individual contributions hidden during aggregation.

use fedveil_fixed_point::FixedVector;

use crate::error::{Result, SharingError};
use crate::share::Share;

/// All shares of a single fixed-point vector, indexed by the ordered
/// participant roster declared at split time.
#[derive(Debug)]
pub struct ShareSet {
    holders: Vec<String>,
    shares: Vec<Share>,
}

impl ShareSet {
    pub(crate) fn new(holders: Vec<String>, shares: Vec<Share>) -> Self {
        debug_assert_eq!(holders.len(), shares.len());
        Self { holders, shares }
    }

    /// The ordered participant roster
    pub fn holders(&self) -> &[String] {
        &self.holders
    }

    /// Number of participants holding a share
    pub fn participant_count(&self) -> usize {
        self.holders.len()
    }

    /// Length of the shared vector
    pub fn len(&self) -> usize {
        self.shares.first().map_or(0, Share::len)
    }

    /// Whether the shared vector has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fractional bits of the underlying encoding
    pub fn precision(&self) -> u8 {
        self.shares.first().map_or(0, |s| s.precision)
    }

    /// The share held by one participant
    pub fn share_of(&self, holder: &str) -> Result<&Share> {
        self.holders
            .iter()
            .position(|h| h == holder)
            .map(|i| &self.shares[i])
            .ok_or_else(|| SharingError::MissingShare(holder.to_string()))
    }

    /// Share-wise local addition: every participant adds its own shares,
    /// yielding the share set of the sum. Rosters must be identical.
    pub fn wrapping_add(&self, other: &Self) -> Result<Self> {
        if self.holders != other.holders {
            return Err(SharingError::ParticipantMismatch {
                expected: self.holders.clone(),
                got: other.holders.clone(),
            });
        }
        if self.precision() != other.precision() {
            return Err(fedveil_fixed_point::FixedPointError::PrecisionMismatch {
                expected: self.precision(),
                got: other.precision(),
            }
            .into());
        }
        if self.len() != other.len() {
            return Err(fedveil_fixed_point::FixedPointError::LengthMismatch {
                expected: self.len(),
                got: other.len(),
            }
            .into());
        }

        let shares: Vec<Share> = self
            .shares
            .iter()
            .zip(&other.shares)
            .map(|(a, b)| a.wrapping_add(b))
            .collect();

        Ok(Self {
            holders: self.holders.clone(),
            shares,
        })
    }

    /// Reveal the value by combining every participant's share. Consumes
    /// the set; the constituent shares are zeroized as they drop.
    pub fn reconstruct(self) -> Result<FixedVector> {
        let mut iter = self.shares.iter();
        let first = iter.next().ok_or(SharingError::EmptyRoster)?;
        let mut total = first.to_fixed_vector();
        for share in iter {
            total = total.wrapping_add(&share.to_fixed_vector())?;
        }
        Ok(total)
    }
}
