//! Stand-ins for the ledger-facing collaborators. Transaction
//! construction and signing live outside this repo; dry runs use these
//! so the rest of the cycle is exercised for real.

use anyhow::bail;
use async_trait::async_trait;

use crate::ports::{ClaimOutcome, FeeClaimer, LedgerSink, Transfer};

/// Reports a fixed claim amount under a caller-chosen reference.
pub struct SimulatedClaimer {
    reference: String,
    claimed_lamports: u128,
}

impl SimulatedClaimer {
    pub fn new(reference: String, claimed_lamports: u128) -> Self {
        Self {
            reference,
            claimed_lamports,
        }
    }
}

#[async_trait]
impl FeeClaimer for SimulatedClaimer {
    async fn claim(&self) -> anyhow::Result<ClaimOutcome> {
        Ok(ClaimOutcome {
            reference: self.reference.clone(),
            claimed_lamports: self.claimed_lamports,
        })
    }
}

/// Refuses every submission. Wired when no real ledger adapter is
/// configured; dry runs never reach it.
pub struct DisabledSink;

#[async_trait]
impl LedgerSink for DisabledSink {
    async fn send(&self, _transfers: &[Transfer]) -> anyhow::Result<String> {
        bail!("no ledger adapter configured; transfers can only run in dry-run mode")
    }
}
