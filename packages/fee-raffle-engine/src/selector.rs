use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::EngineError;
use crate::sequence::SeedSequence;
use crate::types::{Holder, Winner};

/// Raffle weight of a holder: `sqrt(max(0, balance_ui))`. The square
/// root dampens the advantage of very large holders relative to linear
/// weighting while still rewarding holding size. A zero weight excludes
/// the holder from the pool entirely.
pub fn compute_weight(balance_ui: Decimal) -> f64 {
    balance_ui.to_f64().unwrap_or(0.0).max(0.0).sqrt()
}

struct Candidate<'a> {
    holder: &'a Holder,
    weight: f64,
}

/// One roulette-wheel draw over the remaining pool. `r` starts at
/// `rng * total_weight` and each candidate's weight is subtracted in
/// pool order; the first candidate that drives the remainder to zero or
/// below is selected. The final candidate backstops float round-off.
fn pick_one(pool: &[Candidate<'_>], rng: &mut dyn SeedSequence) -> Result<usize, EngineError> {
    let total: f64 = pool.iter().map(|c| c.weight).sum();
    if total <= 0.0 {
        return Err(EngineError::DegenerateWeight);
    }
    let mut r = rng.advance() * total;
    for (i, candidate) in pool.iter().enumerate() {
        r -= candidate.weight;
        if r <= 0.0 {
            return Ok(i);
        }
    }
    Ok(pool.len() - 1)
}

/// Draw `n` distinct winners from the snapshot holders, weighted by
/// `compute_weight`, without replacement. Draw order encodes rank:
/// the first wallet drawn is rank 1 and receives the largest prize
/// share.
///
/// The pool preserves snapshot order as the tie-break order, so the
/// result is a pure function of `(holders, n, sequence)`. Fails without
/// partial output when the pool cannot fill every slot; the caller must
/// abort the cycle's distribution rather than pay a short list.
pub fn pick_winners(
    holders: &[Holder],
    n: usize,
    rng: &mut dyn SeedSequence,
) -> Result<Vec<Winner>, EngineError> {
    let mut pool: Vec<Candidate<'_>> = holders
        .iter()
        .map(|holder| Candidate {
            holder,
            weight: compute_weight(holder.balance_ui),
        })
        .filter(|c| c.weight > 0.0)
        .collect();

    if pool.is_empty() {
        return Err(EngineError::EmptySnapshot);
    }

    let mut winners = Vec::with_capacity(n);
    for _ in 0..n {
        if pool.is_empty() {
            break;
        }
        let idx = pick_one(&pool, rng)?;
        // Plain remove keeps the remaining pool in snapshot order.
        let picked = pool.remove(idx);
        winners.push(Winner {
            wallet: picked.holder.owner.clone(),
            weight: picked.weight,
            balance_raw: picked.holder.balance_raw,
            balance_ui: picked.holder.balance_ui,
        });
    }

    if winners.len() < n {
        return Err(EngineError::InsufficientCandidates {
            obtained: winners.len(),
            required: n,
        });
    }
    Ok(winners)
}
