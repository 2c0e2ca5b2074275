//! Balance source backed by a Helius-style `getTokenAccounts` JSON-RPC
//! endpoint. Walks the paginated account list and flattens it into raw
//! balance records; merging and eligibility are the engine's job.

use anyhow::{bail, Context};
use async_trait::async_trait;
use fee_raffle_engine::BalanceRecord;
use serde::Deserialize;
use serde_json::json;

use crate::ports::BalanceSource;

const PAGE_LIMIT: u32 = 1000;
/// Runaway guard: a mint with more pages than this is a bug upstream.
const MAX_PAGES: u32 = 10_000;

pub struct HeliusBalanceSource {
    http: reqwest::Client,
    url: String,
}

impl HeliusBalanceSource {
    pub fn new(api_key: &str) -> Self {
        Self::with_url(format!("https://mainnet.helius-rpc.com/?api-key={api_key}"))
    }

    pub fn with_url(url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
        }
    }
}

#[derive(Deserialize)]
struct RpcEnvelope {
    result: Option<TokenAccountsPage>,
}

#[derive(Deserialize)]
struct TokenAccountsPage {
    #[serde(default)]
    token_accounts: Vec<TokenAccountRow>,
}

#[derive(Deserialize)]
struct TokenAccountRow {
    owner: Option<String>,
    amount: Option<serde_json::Value>,
    decimals: Option<u8>,
}

impl TokenAccountRow {
    /// The endpoint serves `amount` as either a JSON number or a
    /// decimal string; rows without an owner or a parseable amount are
    /// skipped.
    fn into_record(self) -> Option<BalanceRecord> {
        let owner = self.owner?;
        let raw_amount = match self.amount? {
            serde_json::Value::String(s) => s.parse::<u128>().ok()?,
            serde_json::Value::Number(n) => u128::from(n.as_u64()?),
            _ => return None,
        };
        Some(BalanceRecord {
            owner,
            raw_amount,
            decimals: self.decimals.unwrap_or(0),
        })
    }
}

#[async_trait]
impl BalanceSource for HeliusBalanceSource {
    async fn token_balances(&self, mint: &str) -> anyhow::Result<Vec<BalanceRecord>> {
        let mut records = Vec::new();
        let mut page: u32 = 1;

        loop {
            let body = json!({
                "jsonrpc": "2.0",
                "id": "fee-raffle-holders",
                "method": "getTokenAccounts",
                "params": {
                    "page": page,
                    "limit": PAGE_LIMIT,
                    "displayOptions": {},
                    "mint": mint,
                },
            });

            let response = self
                .http
                .post(&self.url)
                .json(&body)
                .send()
                .await
                .with_context(|| format!("getTokenAccounts request failed (page {page})"))?
                .error_for_status()
                .with_context(|| format!("getTokenAccounts returned an error (page {page})"))?;

            let envelope: RpcEnvelope = response
                .json()
                .await
                .with_context(|| format!("getTokenAccounts response malformed (page {page})"))?;

            let rows = envelope
                .result
                .map(|r| r.token_accounts)
                .unwrap_or_default();
            if rows.is_empty() {
                break;
            }
            records.extend(rows.into_iter().filter_map(TokenAccountRow::into_record));

            page += 1;
            if page > MAX_PAGES {
                bail!("token account pagination runaway (page > {MAX_PAGES})");
            }
        }

        Ok(records)
    }
}
