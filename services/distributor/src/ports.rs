//! Collaborator seams. Network retrieval, ledger submission, durable
//! storage and notification all live behind these traits; the cycle
//! only ever sees their materialized results.

use async_trait::async_trait;
use fee_raffle_engine::BalanceRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of claiming accrued creator fees for one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimOutcome {
    /// Unique reference for the claim (a transaction signature on a
    /// real ledger). Seeds the raffle and keys the cycle record.
    pub reference: String,
    pub claimed_lamports: u128,
}

/// One value transfer in integer base units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub recipient: String,
    pub lamports: u128,
}

/// Full cycle record handed to the persistence collaborator. Writes
/// must be idempotent on `claim_reference`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub claim_reference: String,
    pub fees_claimed_lamports: u128,
    pub fees_claimed_sol: Decimal,
    pub fixed_wallet: String,
    pub fixed_reference: Option<String>,
    pub raffle_reference: Option<String>,
    pub mint_address: String,
    pub snapshot_hash: String,
    pub seed: String,
    pub interval_seconds: u64,
    pub dry_run: bool,
    pub winners: Vec<WinnerRecord>,
    pub notes: Option<String>,
}

/// One winner row, rank 1 first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinnerRecord {
    pub rank: u32,
    pub wallet: String,
    pub weight: f64,
    pub balance_raw: u128,
    pub balance_ui: Decimal,
    pub prize_bps: u16,
    pub prize_lamports: u128,
    pub prize_sol: Decimal,
}

/// Claims accrued creator fees and reports how much arrived.
#[async_trait]
pub trait FeeClaimer: Send + Sync {
    async fn claim(&self) -> anyhow::Result<ClaimOutcome>;
}

/// Supplies the flattened sequence of balance records for a mint.
/// Pagination and network retry are this collaborator's business.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn token_balances(&self, mint: &str) -> anyhow::Result<Vec<BalanceRecord>>;
}

/// Submits one batch of transfers to the ledger and returns a
/// confirmation reference. Batching strategy above this seam, transfer
/// construction and signing below it.
#[async_trait]
pub trait LedgerSink: Send + Sync {
    async fn send(&self, transfers: &[Transfer]) -> anyhow::Result<String>;
}

/// Durable, append-only storage for cycle records.
#[async_trait]
pub trait CycleStore: Send + Sync {
    async fn record_cycle(&self, record: &CycleRecord) -> anyhow::Result<()>;
}

/// Outbound human notifications. Failures here must never fail a cycle.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> anyhow::Result<()>;
}
