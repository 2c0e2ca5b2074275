use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A raw balance row as delivered by the balance source, one per token
/// account. Multiple records may share an owner; the snapshot builder
/// merges them by summation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub owner: String,
    pub raw_amount: u128,
    pub decimals: u8,
}

/// An eligible holder after merging: one entry per distinct owner,
/// `balance_raw > 0` and `balance_ui` at or above the eligibility
/// threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
    pub owner: String,
    pub balance_raw: u128,
    /// `balance_raw / 10^decimals`, in exact decimal arithmetic.
    pub balance_ui: Decimal,
}

/// The canonical, hashed view of all eligible holders at the moment a
/// cycle begins. Holders are sorted by owner ascending (byte-wise), and
/// the hash is a pure function of the sorted `(owner, balance_raw)`
/// pairs. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub holders: Vec<Holder>,
    /// Hex-encoded SHA-256 over `owner:raw` pairs joined by `|`.
    pub hash: String,
}

/// One raffle slot. The ordered winner list for a cycle has no duplicate
/// wallets; list position is draw order, and draw order is rank order
/// (rank 1 receives the largest prize share).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Winner {
    pub wallet: String,
    pub weight: f64,
    pub balance_raw: u128,
    pub balance_ui: Decimal,
}
