use anyhow::{bail, Context};
use fee_raffle_engine::{build_snapshot, pick_winners, EngineError, Winner, XorShiftSequence};
use tracing::{info, warn};

use crate::config::Config;
use crate::payout::{build_payout_plan, execute_payout, lamports_to_sol, PayoutPlan};
use crate::ports::{
    BalanceSource, ClaimOutcome, CycleRecord, CycleStore, FeeClaimer, LedgerSink, Notifier,
    WinnerRecord,
};

/// Everything the cycle talks to. The engine sits between these seams
/// as a pure computation; swapping any collaborator cannot change who
/// wins or how much they receive.
pub struct Collaborators<'a> {
    pub claimer: &'a dyn FeeClaimer,
    pub balances: &'a dyn BalanceSource,
    pub sink: &'a dyn LedgerSink,
    pub store: &'a dyn CycleStore,
    pub notifier: &'a dyn Notifier,
}

/// How a cycle ended. Every variant is a success; failures propagate as
/// errors and leave nothing half-distributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The claim yielded nothing to distribute.
    NoFees { claim_reference: String },
    /// Zero eligible holders; legitimate, short-circuits the raffle.
    NoEligibleHolders {
        claim_reference: String,
        claimed_lamports: u128,
    },
    Distributed {
        claim_reference: String,
        claimed_lamports: u128,
        winner_count: usize,
        dry_run: bool,
    },
}

/// Run one full distribution cycle: claim, snapshot, draw, allocate,
/// pay, persist, notify. The winners and amounts are fully computed
/// before any transfer is attempted, so an abort at any point leaves no
/// partial state to undo.
pub async fn run_cycle(
    config: &Config,
    collaborators: &Collaborators<'_>,
) -> anyhow::Result<CycleOutcome> {
    let claim = collaborators
        .claimer
        .claim()
        .await
        .context("fee claim failed")?;
    let claimed_sol = lamports_to_sol(claim.claimed_lamports);
    info!(
        reference = %claim.reference,
        lamports = claim.claimed_lamports,
        "claimed creator fees"
    );

    if claim.claimed_lamports == 0 {
        notify_best_effort(
            collaborators.notifier,
            &format!("Fee claim {}: no fees available.", claim.reference),
        )
        .await;
        return Ok(CycleOutcome::NoFees {
            claim_reference: claim.reference,
        });
    }

    if claimed_sol > config.max_payout_sol_per_cycle {
        bail!(
            "safety stop: claimed {claimed_sol} SOL exceeds per-cycle maximum {}",
            config.max_payout_sol_per_cycle
        );
    }

    let records = collaborators
        .balances
        .token_balances(&config.mint_address)
        .await
        .context("balance fetch failed")?;
    let snapshot = build_snapshot(&records, config.min_hold_tokens);
    info!(
        holders = snapshot.holders.len(),
        hash = %snapshot.hash,
        "built holder snapshot"
    );

    if snapshot.holders.is_empty() {
        notify_best_effort(
            collaborators.notifier,
            &format!(
                "Fee claim {}: no eligible holders, nothing raffled.",
                claim.reference
            ),
        )
        .await;
        return Ok(CycleOutcome::NoEligibleHolders {
            claim_reference: claim.reference,
            claimed_lamports: claim.claimed_lamports,
        });
    }

    let seed = format!("{}:{}", claim.reference, snapshot.hash);
    let mut sequence = XorShiftSequence::from_seed(&seed);
    let winners = match pick_winners(&snapshot.holders, config.winner_count, &mut sequence) {
        Ok(winners) => winners,
        Err(EngineError::EmptySnapshot) => {
            return Ok(CycleOutcome::NoEligibleHolders {
                claim_reference: claim.reference,
                claimed_lamports: claim.claimed_lamports,
            });
        }
        Err(err) => return Err(err).context("winner selection failed"),
    };

    let plan = build_payout_plan(
        claim.claimed_lamports,
        &config.split_table,
        &config.prize_table,
        config.winner_count,
    )?;

    let references = if config.dry_run {
        info!("dry run, skipping ledger submission");
        None
    } else {
        Some(
            execute_payout(collaborators.sink, &config.fixed_wallet, &winners, &plan)
                .await
                .context("payout failed")?,
        )
    };

    let record = CycleRecord {
        claim_reference: claim.reference.clone(),
        fees_claimed_lamports: claim.claimed_lamports,
        fees_claimed_sol: claimed_sol,
        fixed_wallet: config.fixed_wallet.clone(),
        fixed_reference: references.as_ref().map(|r| r.fixed.clone()),
        raffle_reference: references.as_ref().map(|r| r.raffle.clone()),
        mint_address: config.mint_address.clone(),
        snapshot_hash: snapshot.hash.clone(),
        seed: seed.clone(),
        interval_seconds: config.interval_seconds,
        dry_run: config.dry_run,
        winners: winner_records(&winners, &plan, config),
        notes: None,
    };
    collaborators
        .store
        .record_cycle(&record)
        .await
        .context("cycle persistence failed")?;

    notify_best_effort(
        collaborators.notifier,
        &cycle_summary(&claim, &snapshot.hash, &seed, &winners, &plan, config),
    )
    .await;

    Ok(CycleOutcome::Distributed {
        claim_reference: claim.reference,
        claimed_lamports: claim.claimed_lamports,
        winner_count: winners.len(),
        dry_run: config.dry_run,
    })
}

fn winner_records(winners: &[Winner], plan: &PayoutPlan, config: &Config) -> Vec<WinnerRecord> {
    winners
        .iter()
        .zip(&plan.prize_lamports)
        .zip(config.prize_table.shares())
        .enumerate()
        .map(|(i, ((winner, &lamports), &bps))| WinnerRecord {
            rank: i as u32 + 1,
            wallet: winner.wallet.clone(),
            weight: winner.weight,
            balance_raw: winner.balance_raw,
            balance_ui: winner.balance_ui,
            prize_bps: bps,
            prize_lamports: lamports,
            prize_sol: lamports_to_sol(lamports),
        })
        .collect()
}

fn cycle_summary(
    claim: &ClaimOutcome,
    snapshot_hash: &str,
    seed: &str,
    winners: &[Winner],
    plan: &PayoutPlan,
    config: &Config,
) -> String {
    let mut text = format!(
        "Fee claim {}\nClaimed: {} SOL\nFixed share: {} SOL\nRaffle share: {} SOL\nSnapshot: {}\nSeed: {}\n\nWinners\n",
        claim.reference,
        lamports_to_sol(claim.claimed_lamports),
        lamports_to_sol(plan.fixed_lamports),
        lamports_to_sol(plan.raffle_lamports),
        snapshot_hash,
        seed,
    );
    for (i, (winner, &lamports)) in winners.iter().zip(&plan.prize_lamports).enumerate() {
        let wallet = &winner.wallet;
        let short = if wallet.len() > 8 {
            format!("{}\u{2026}{}", &wallet[..4], &wallet[wallet.len() - 4..])
        } else {
            wallet.clone()
        };
        text.push_str(&format!(
            "{}) {} \u{2014} {} SOL\n",
            i + 1,
            short,
            lamports_to_sol(lamports)
        ));
    }
    if config.dry_run {
        text.push_str("\n(dry run, no transfers submitted)");
    }
    text
}

async fn notify_best_effort(notifier: &dyn Notifier, text: &str) {
    if let Err(err) = notifier.send(text).await {
        warn!(error = %err, "notification failed");
    }
}
