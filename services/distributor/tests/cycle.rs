//! End-to-end cycle tests. Every collaborator is an in-memory double,
//! so these exercise the full claim → snapshot → draw → allocate →
//! payout → persist → notify pipeline with exact, replayable inputs.

use std::sync::Mutex;

use anyhow::bail;
use async_trait::async_trait;
use fee_raffle_engine::{BalanceRecord, ShareTable};
use rust_decimal::Decimal;

use fee_raffle_distributor::config::{Config, PRIZE_BPS, SPLIT_BPS, WINNER_COUNT};
use fee_raffle_distributor::cycle::{run_cycle, Collaborators, CycleOutcome};
use fee_raffle_distributor::ports::{
    BalanceSource, CycleRecord, CycleStore, LedgerSink, Notifier, Transfer,
};
use fee_raffle_distributor::sim::SimulatedClaimer;

// ─── Doubles ───

struct StaticBalances {
    records: Vec<BalanceRecord>,
}

#[async_trait]
impl BalanceSource for StaticBalances {
    async fn token_balances(&self, _mint: &str) -> anyhow::Result<Vec<BalanceRecord>> {
        Ok(self.records.clone())
    }
}

#[derive(Default)]
struct RecordingSink {
    batches: Mutex<Vec<Vec<Transfer>>>,
    fail_next_multi: Mutex<bool>,
}

#[async_trait]
impl LedgerSink for RecordingSink {
    async fn send(&self, transfers: &[Transfer]) -> anyhow::Result<String> {
        if transfers.len() > 1 {
            let mut fail = self.fail_next_multi.lock().unwrap();
            if *fail {
                *fail = false;
                bail!("simulated batch failure");
            }
        }
        let mut batches = self.batches.lock().unwrap();
        batches.push(transfers.to_vec());
        Ok(format!("tx-{}", batches.len()))
    }
}

#[derive(Default)]
struct MemoryStore {
    records: Mutex<Vec<CycleRecord>>,
}

#[async_trait]
impl CycleStore for MemoryStore {
    async fn record_cycle(&self, record: &CycleRecord) -> anyhow::Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        if self.fail {
            bail!("simulated notifier outage");
        }
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

// ─── Fixtures ───

fn test_config(dry_run: bool) -> Config {
    Config {
        helius_api_key: "test-key".to_string(),
        mint_address: "MintAddress111111111111111111111111111111".to_string(),
        fixed_wallet: "FixedWallet11111111111111111111111111111".to_string(),
        database_url: "postgres://unused".to_string(),
        interval_seconds: 300,
        min_hold_tokens: Decimal::ZERO,
        max_payout_sol_per_cycle: Decimal::from(50),
        telegram_bot_token: String::new(),
        telegram_chat_id: String::new(),
        dry_run,
        dry_run_claim_lamports: 0,
        winner_count: WINNER_COUNT,
        split_table: ShareTable::new(SPLIT_BPS.to_vec()).unwrap(),
        prize_table: ShareTable::new(PRIZE_BPS.to_vec()).unwrap(),
    }
}

fn balance_records(holders: usize) -> Vec<BalanceRecord> {
    let mut records: Vec<BalanceRecord> = (0..holders)
        .map(|i| BalanceRecord {
            owner: format!("wallet{i:03}"),
            raw_amount: 1_000_000 + i as u128 * 50_000,
            decimals: 6,
        })
        .collect();
    // A second account for the first owner; the snapshot must merge it.
    if holders > 0 {
        records.push(BalanceRecord {
            owner: "wallet000".to_string(),
            raw_amount: 250_000,
            decimals: 6,
        });
    }
    records
}

const CLAIMED: u128 = 1_000_000_007;

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn dry_run_cycle_distributes_and_records() {
    let config = test_config(true);
    let claimer = SimulatedClaimer::new("claimsig".to_string(), CLAIMED);
    let balances = StaticBalances {
        records: balance_records(30),
    };
    let sink = RecordingSink::default();
    let store = MemoryStore::default();
    let notifier = RecordingNotifier::default();

    let outcome = run_cycle(
        &config,
        &Collaborators {
            claimer: &claimer,
            balances: &balances,
            sink: &sink,
            store: &store,
            notifier: &notifier,
        },
    )
    .await
    .unwrap();

    assert_eq!(
        outcome,
        CycleOutcome::Distributed {
            claim_reference: "claimsig".to_string(),
            claimed_lamports: CLAIMED,
            winner_count: WINNER_COUNT,
            dry_run: true,
        }
    );

    // Dry run never touches the ledger.
    assert!(sink.batches.lock().unwrap().is_empty());

    let records = store.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.claim_reference, "claimsig");
    assert_eq!(record.fees_claimed_lamports, CLAIMED);
    assert_eq!(record.snapshot_hash.len(), 64);
    assert_eq!(
        record.seed,
        format!("claimsig:{}", record.snapshot_hash)
    );
    assert_eq!(record.fixed_reference, None);
    assert_eq!(record.raffle_reference, None);

    // Exact conservation through both allocation levels.
    let prize_total: u128 = record.winners.iter().map(|w| w.prize_lamports).sum();
    assert_eq!(prize_total, CLAIMED - CLAIMED / 2);
    assert_eq!(record.winners.len(), WINNER_COUNT);
    for (i, winner) in record.winners.iter().enumerate() {
        assert_eq!(winner.rank as usize, i + 1);
        assert_eq!(winner.prize_bps, PRIZE_BPS[i]);
    }

    let messages = notifier.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("claimsig"));
}

#[tokio::test]
async fn same_seed_reproduces_the_same_winners() {
    // Two separate invocations, identical claim reference
    // and holder set, identical winner order.
    let config = test_config(true);
    let mut winner_lists = Vec::new();

    for _ in 0..2 {
        let claimer = SimulatedClaimer::new("repeatable-sig".to_string(), CLAIMED);
        let balances = StaticBalances {
            records: balance_records(40),
        };
        let sink = RecordingSink::default();
        let store = MemoryStore::default();
        let notifier = RecordingNotifier::default();

        run_cycle(
            &config,
            &Collaborators {
                claimer: &claimer,
                balances: &balances,
                sink: &sink,
                store: &store,
                notifier: &notifier,
            },
        )
        .await
        .unwrap();

        let records = store.records.lock().unwrap();
        let wallets: Vec<String> = records[0]
            .winners
            .iter()
            .map(|w| w.wallet.clone())
            .collect();
        winner_lists.push(wallets);
    }

    assert_eq!(winner_lists[0], winner_lists[1]);
}

#[tokio::test]
async fn zero_claim_short_circuits() {
    let config = test_config(true);
    let claimer = SimulatedClaimer::new("empty-claim".to_string(), 0);
    let balances = StaticBalances {
        records: balance_records(30),
    };
    let sink = RecordingSink::default();
    let store = MemoryStore::default();
    let notifier = RecordingNotifier::default();

    let outcome = run_cycle(
        &config,
        &Collaborators {
            claimer: &claimer,
            balances: &balances,
            sink: &sink,
            store: &store,
            notifier: &notifier,
        },
    )
    .await
    .unwrap();

    assert_eq!(
        outcome,
        CycleOutcome::NoFees {
            claim_reference: "empty-claim".to_string()
        }
    );
    assert!(store.records.lock().unwrap().is_empty());
    assert_eq!(notifier.messages.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn no_eligible_holders_short_circuits() {
    let config = test_config(true);
    let claimer = SimulatedClaimer::new("no-holders".to_string(), CLAIMED);
    let balances = StaticBalances { records: vec![] };
    let sink = RecordingSink::default();
    let store = MemoryStore::default();
    let notifier = RecordingNotifier::default();

    let outcome = run_cycle(
        &config,
        &Collaborators {
            claimer: &claimer,
            balances: &balances,
            sink: &sink,
            store: &store,
            notifier: &notifier,
        },
    )
    .await
    .unwrap();

    assert_eq!(
        outcome,
        CycleOutcome::NoEligibleHolders {
            claim_reference: "no-holders".to_string(),
            claimed_lamports: CLAIMED,
        }
    );
    assert!(store.records.lock().unwrap().is_empty());
}

#[tokio::test]
async fn insufficient_holders_abort_without_persisting() {
    // 3 eligible holders, 10 slots: the cycle must abort cleanly.
    let config = test_config(true);
    let claimer = SimulatedClaimer::new("short-pool".to_string(), CLAIMED);
    let balances = StaticBalances {
        records: balance_records(3),
    };
    let sink = RecordingSink::default();
    let store = MemoryStore::default();
    let notifier = RecordingNotifier::default();

    let err = run_cycle(
        &config,
        &Collaborators {
            claimer: &claimer,
            balances: &balances,
            sink: &sink,
            store: &store,
            notifier: &notifier,
        },
    )
    .await
    .unwrap_err();

    assert!(format!("{err:#}").contains("picked 3 of 10"));
    assert!(store.records.lock().unwrap().is_empty());
    assert!(sink.batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn wet_run_submits_fixed_then_raffle_batch() {
    let config = test_config(false);
    let claimer = SimulatedClaimer::new("wet-sig".to_string(), CLAIMED);
    let balances = StaticBalances {
        records: balance_records(30),
    };
    let sink = RecordingSink::default();
    let store = MemoryStore::default();
    let notifier = RecordingNotifier::default();

    run_cycle(
        &config,
        &Collaborators {
            claimer: &claimer,
            balances: &balances,
            sink: &sink,
            store: &store,
            notifier: &notifier,
        },
    )
    .await
    .unwrap();

    let batches = sink.batches.lock().unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].len(), 1);
    assert_eq!(batches[0][0].recipient, config.fixed_wallet);
    assert_eq!(batches[0][0].lamports, CLAIMED / 2);
    assert_eq!(batches[1].len(), WINNER_COUNT);
    let raffle_total: u128 = batches[1].iter().map(|t| t.lamports).sum();
    assert_eq!(raffle_total, CLAIMED - CLAIMED / 2);

    let records = store.records.lock().unwrap();
    assert_eq!(records[0].fixed_reference.as_deref(), Some("tx-1"));
    assert_eq!(records[0].raffle_reference.as_deref(), Some("tx-2"));
}

#[tokio::test]
async fn failed_batch_retries_as_two_halves() {
    let config = test_config(false);
    let claimer = SimulatedClaimer::new("retry-sig".to_string(), CLAIMED);
    let balances = StaticBalances {
        records: balance_records(30),
    };
    let sink = RecordingSink {
        fail_next_multi: Mutex::new(true),
        ..Default::default()
    };
    let store = MemoryStore::default();
    let notifier = RecordingNotifier::default();

    run_cycle(
        &config,
        &Collaborators {
            claimer: &claimer,
            balances: &balances,
            sink: &sink,
            store: &store,
            notifier: &notifier,
        },
    )
    .await
    .unwrap();

    // Fixed transfer, then two half batches of five.
    let batches = sink.batches.lock().unwrap();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[1].len(), WINNER_COUNT / 2);
    assert_eq!(batches[2].len(), WINNER_COUNT - WINNER_COUNT / 2);
    let retried_total: u128 = batches[1..]
        .iter()
        .flatten()
        .map(|t| t.lamports)
        .sum();
    assert_eq!(retried_total, CLAIMED - CLAIMED / 2);

    let records = store.records.lock().unwrap();
    assert_eq!(records[0].raffle_reference.as_deref(), Some("tx-2,tx-3"));
}

#[tokio::test]
async fn safety_cap_aborts_before_any_transfer() {
    let mut config = test_config(false);
    config.max_payout_sol_per_cycle = "0.5".parse().unwrap();
    let claimer = SimulatedClaimer::new("too-big".to_string(), CLAIMED);
    let balances = StaticBalances {
        records: balance_records(30),
    };
    let sink = RecordingSink::default();
    let store = MemoryStore::default();
    let notifier = RecordingNotifier::default();

    let err = run_cycle(
        &config,
        &Collaborators {
            claimer: &claimer,
            balances: &balances,
            sink: &sink,
            store: &store,
            notifier: &notifier,
        },
    )
    .await
    .unwrap_err();

    assert!(format!("{err:#}").contains("safety stop"));
    assert!(sink.batches.lock().unwrap().is_empty());
    assert!(store.records.lock().unwrap().is_empty());
}

#[tokio::test]
async fn notifier_failure_does_not_fail_the_cycle() {
    let config = test_config(true);
    let claimer = SimulatedClaimer::new("quiet-sig".to_string(), CLAIMED);
    let balances = StaticBalances {
        records: balance_records(30),
    };
    let sink = RecordingSink::default();
    let store = MemoryStore::default();
    let notifier = RecordingNotifier {
        fail: true,
        ..Default::default()
    };

    let outcome = run_cycle(
        &config,
        &Collaborators {
            claimer: &claimer,
            balances: &balances,
            sink: &sink,
            store: &store,
            notifier: &notifier,
        },
    )
    .await
    .unwrap();

    assert!(matches!(outcome, CycleOutcome::Distributed { .. }));
    assert_eq!(store.records.lock().unwrap().len(), 1);
}
