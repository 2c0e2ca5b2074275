use anyhow::{bail, ensure, Context};
use fee_raffle_engine::{allocate, ShareTable, Winner};
use rust_decimal::Decimal;
use tracing::warn;

use crate::ports::{LedgerSink, Transfer};

/// Lamports per SOL.
const LAMPORTS_PER_SOL_SCALE: u32 = 9;

/// Exact decimal SOL value of a lamport amount.
pub fn lamports_to_sol(lamports: u128) -> Decimal {
    match i128::try_from(lamports) {
        Ok(mantissa) => Decimal::try_from_i128_with_scale(mantissa, LAMPORTS_PER_SOL_SCALE)
            .unwrap_or(Decimal::MAX),
        Err(_) => Decimal::MAX,
    }
}

/// The complete integer payout for one cycle, computed before any
/// transfer is attempted and immutable afterwards. Retries re-submit
/// these amounts; nothing is ever re-drawn or re-split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutPlan {
    pub fixed_lamports: u128,
    pub raffle_lamports: u128,
    /// Prize per winner, rank 1 first. Sums to `raffle_lamports`.
    pub prize_lamports: Vec<u128>,
}

/// Split the claimed amount through the fixed/raffle table, then the
/// raffle share through the per-rank prize table. Conservation holds at
/// both levels: `fixed + raffle == claimed` and `sum(prizes) == raffle`.
pub fn build_payout_plan(
    claimed_lamports: u128,
    split_table: &ShareTable,
    prize_table: &ShareTable,
    winner_count: usize,
) -> anyhow::Result<PayoutPlan> {
    ensure!(
        split_table.len() == 2,
        "fixed/raffle split must have exactly 2 shares (got {})",
        split_table.len()
    );
    ensure!(
        prize_table.len() == winner_count,
        "prize table has {} shares for {} winners",
        prize_table.len(),
        winner_count
    );

    let split = allocate(claimed_lamports, split_table);
    let (fixed_lamports, raffle_lamports) = (split[0], split[1]);
    let prize_lamports = allocate(raffle_lamports, prize_table);

    Ok(PayoutPlan {
        fixed_lamports,
        raffle_lamports,
        prize_lamports,
    })
}

/// Confirmation references returned by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutReferences {
    pub fixed: String,
    pub raffle: String,
}

/// Deliver the plan: the fixed transfer first, then the winner
/// transfers as one batch. If the full batch fails once it is retried
/// as two halves; the amounts are the plan's amounts either way.
pub async fn execute_payout(
    sink: &dyn LedgerSink,
    fixed_wallet: &str,
    winners: &[Winner],
    plan: &PayoutPlan,
) -> anyhow::Result<PayoutReferences> {
    if winners.len() != plan.prize_lamports.len() {
        bail!(
            "payout plan has {} prizes for {} winners",
            plan.prize_lamports.len(),
            winners.len()
        );
    }

    let fixed = sink
        .send(&[Transfer {
            recipient: fixed_wallet.to_string(),
            lamports: plan.fixed_lamports,
        }])
        .await
        .context("fixed transfer failed")?;

    let transfers: Vec<Transfer> = winners
        .iter()
        .zip(&plan.prize_lamports)
        .map(|(winner, &lamports)| Transfer {
            recipient: winner.wallet.clone(),
            lamports,
        })
        .collect();

    let raffle = match sink.send(&transfers).await {
        Ok(reference) => reference,
        Err(err) => {
            warn!(error = %err, "raffle batch failed, retrying as two halves");
            let mid = transfers.len() / 2;
            let first = sink
                .send(&transfers[..mid])
                .await
                .context("first raffle half failed")?;
            let second = sink
                .send(&transfers[mid..])
                .await
                .context("second raffle half failed")?;
            format!("{first},{second}")
        }
    };

    Ok(PayoutReferences { fixed, raffle })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PRIZE_BPS, SPLIT_BPS, WINNER_COUNT};

    fn tables() -> (ShareTable, ShareTable) {
        (
            ShareTable::new(SPLIT_BPS.to_vec()).unwrap(),
            ShareTable::new(PRIZE_BPS.to_vec()).unwrap(),
        )
    }

    #[test]
    fn plan_conserves_the_claim_at_both_levels() {
        let (split, prize) = tables();
        for claimed in [0u128, 1, 7, 999_999_999, 1_000_000_007, 50_000_000_000] {
            let plan = build_payout_plan(claimed, &split, &prize, WINNER_COUNT).unwrap();
            assert_eq!(plan.fixed_lamports + plan.raffle_lamports, claimed);
            assert_eq!(
                plan.prize_lamports.iter().sum::<u128>(),
                plan.raffle_lamports,
                "claimed={claimed}"
            );
        }
    }

    #[test]
    fn odd_claim_splits_with_the_raffle_taking_the_remainder() {
        let (split, prize) = tables();
        let plan = build_payout_plan(7, &split, &prize, WINNER_COUNT).unwrap();
        assert_eq!(plan.fixed_lamports, 3);
        assert_eq!(plan.raffle_lamports, 4);
    }

    #[test]
    fn winner_count_mismatch_is_rejected() {
        let (split, prize) = tables();
        assert!(build_payout_plan(100, &split, &prize, 7).is_err());
    }

    #[test]
    fn lamports_convert_to_sol_exactly() {
        assert_eq!(lamports_to_sol(1_000_000_000), Decimal::from(1));
        assert_eq!(lamports_to_sol(1), "0.000000001".parse().unwrap());
        assert_eq!(lamports_to_sol(1_500_000_000), "1.5".parse().unwrap());
    }
}
