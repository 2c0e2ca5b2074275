use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Total basis points in a whole: 10000 bps = 100%.
pub const TOTAL_BPS: u32 = 10_000;

/// A validated, ordered table of basis-point shares summing to exactly
/// 10000. Validation happens once at startup; a table that fails it is
/// a configuration error, never a per-cycle one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareTable(Vec<u16>);

impl ShareTable {
    pub fn new(shares: Vec<u16>) -> Result<Self, EngineError> {
        let sum: u32 = shares.iter().map(|&bps| u32::from(bps)).sum();
        if sum != TOTAL_BPS {
            return Err(EngineError::InvalidShareTable { sum });
        }
        Ok(Self(shares))
    }

    pub fn shares(&self) -> &[u16] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `floor(total * bps / 10000)` computed without the widening multiply,
/// so the full u128 range of `total` is safe: `total` is split into its
/// whole and fractional parts modulo 10000 first, and `whole * bps`
/// cannot exceed `total`.
fn floor_share(total: u128, bps: u16) -> u128 {
    let bps = u128::from(bps);
    let per_whole = u128::from(TOTAL_BPS);
    (total / per_whole) * bps + (total % per_whole) * bps / per_whole
}

/// Split `total` indivisible units across the table's shares, aligned
/// index-for-index, with `sum(result) == total` exactly for every
/// `total`, including zero and `u128::MAX`.
///
/// Every index except the last takes `floor(total * bps / 10000)` in
/// u128 arithmetic; the last share absorbs all residual truncation, so
/// conservation holds by construction no matter how many shares round
/// down.
pub fn allocate(total: u128, table: &ShareTable) -> Vec<u128> {
    let shares = table.shares();
    let mut amounts = Vec::with_capacity(shares.len());
    let mut allocated: u128 = 0;
    for (i, &bps) in shares.iter().enumerate() {
        let amount = if i + 1 == shares.len() {
            total - allocated
        } else {
            floor_share(total, bps)
        };
        allocated += amount;
        amounts.push(amount);
    }
    amounts
}
