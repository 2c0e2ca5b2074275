use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::types::{BalanceRecord, Holder, Snapshot};

/// Convert a raw amount to its UI value: `raw / 10^decimals`, in exact
/// decimal arithmetic. Balances whose mantissa exceeds the 96-bit
/// capacity of `Decimal` saturate to `Decimal::MAX`; they remain
/// eligible under any sane threshold.
pub(crate) fn ui_amount(raw: u128, decimals: u8) -> Decimal {
    match i128::try_from(raw) {
        Ok(mantissa) => Decimal::try_from_i128_with_scale(mantissa, u32::from(decimals))
            .unwrap_or(Decimal::MAX),
        Err(_) => Decimal::MAX,
    }
}

/// Build the canonical snapshot from raw balance records.
///
/// Records are merged by owner (raw amounts summed; the first-seen
/// decimals value wins for that owner). Owners with a zero raw balance
/// or a UI balance below `min_balance_ui` are dropped. The surviving
/// holders are sorted by owner ascending, byte-wise, never with a
/// locale-aware collation, and hashed as `owner:raw` pairs joined by
/// `|` through SHA-256.
///
/// Pure function of its input: shuffling the record order changes
/// neither the holder list nor the hash. An empty result is valid and
/// surfaces as zero eligible holders to the caller.
pub fn build_snapshot(records: &[BalanceRecord], min_balance_ui: Decimal) -> Snapshot {
    let mut merged: BTreeMap<&str, (u128, u8)> = BTreeMap::new();
    for record in records {
        merged
            .entry(record.owner.as_str())
            .and_modify(|(raw, _)| *raw = raw.saturating_add(record.raw_amount))
            .or_insert((record.raw_amount, record.decimals));
    }

    let mut holders = Vec::with_capacity(merged.len());
    for (owner, (raw, decimals)) in merged {
        if raw == 0 {
            continue;
        }
        let balance_ui = ui_amount(raw, decimals);
        if balance_ui < min_balance_ui {
            continue;
        }
        holders.push(Holder {
            owner: owner.to_string(),
            balance_raw: raw,
            balance_ui,
        });
    }

    let mut hasher = Sha256::new();
    for (i, holder) in holders.iter().enumerate() {
        if i > 0 {
            hasher.update(b"|");
        }
        hasher.update(holder.owner.as_bytes());
        hasher.update(b":");
        hasher.update(holder.balance_raw.to_string().as_bytes());
    }
    let hash = hex::encode(hasher.finalize());

    Snapshot { holders, hash }
}
