use fee_raffle_engine::{EngineError, ShareTable};
use rust_decimal::Decimal;
use thiserror::Error;

/// Number of raffle slots per cycle.
pub const WINNER_COUNT: usize = 10;

/// Per-rank prize shares in basis points: 32%, 12%, 12%, 8%, 8%, 8%,
/// 5%, 5%, 5%, 5%. Rank 1 is drawn first and takes the largest share.
pub const PRIZE_BPS: [u16; WINNER_COUNT] = [3200, 1200, 1200, 800, 800, 800, 500, 500, 500, 500];

/// Fixed-wallet / raffle split of each claim, in basis points.
pub const SPLIT_BPS: [u16; 2] = [5000, 5000];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing env var: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("prize table has {shares} shares but {winners} winners are drawn")]
    PrizeCountMismatch { shares: usize, winners: usize },
}

/// Runtime configuration, read once at startup from the environment.
/// Share tables are validated here; a bad table is fatal before the
/// first cycle ever runs.
#[derive(Debug, Clone)]
pub struct Config {
    pub helius_api_key: String,
    pub mint_address: String,
    pub fixed_wallet: String,
    pub database_url: String,

    pub interval_seconds: u64,
    pub min_hold_tokens: Decimal,
    pub max_payout_sol_per_cycle: Decimal,

    /// Empty string disables Telegram notifications.
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,

    pub dry_run: bool,
    /// Claim amount fed to the simulated claimer in dry runs.
    pub dry_run_claim_lamports: u128,

    pub winner_count: usize,
    pub split_table: ShareTable,
    pub prize_table: ShareTable,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let req = |name: &'static str| -> Result<String, ConfigError> {
            match lookup(name) {
                Some(v) if !v.is_empty() => Ok(v),
                _ => Err(ConfigError::MissingVar(name)),
            }
        };
        let opt = |name: &str| lookup(name).unwrap_or_default();
        let num_u64 = |name: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(name) {
                None => Ok(default),
                Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                    name,
                    value: v.clone(),
                }),
            }
        };
        let num_u128 = |name: &'static str, default: u128| -> Result<u128, ConfigError> {
            match lookup(name) {
                None => Ok(default),
                Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                    name,
                    value: v.clone(),
                }),
            }
        };
        let decimal = |name: &'static str, default: Decimal| -> Result<Decimal, ConfigError> {
            match lookup(name) {
                None => Ok(default),
                Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                    name,
                    value: v.clone(),
                }),
            }
        };
        let boolean = |name: &str, default: bool| -> bool {
            match lookup(name) {
                None => default,
                Some(v) => matches!(
                    v.to_lowercase().as_str(),
                    "1" | "true" | "yes" | "y" | "on"
                ),
            }
        };

        let split_table = ShareTable::new(SPLIT_BPS.to_vec())?;
        let prize_table = ShareTable::new(PRIZE_BPS.to_vec())?;
        if prize_table.len() != WINNER_COUNT {
            return Err(ConfigError::PrizeCountMismatch {
                shares: prize_table.len(),
                winners: WINNER_COUNT,
            });
        }

        Ok(Self {
            helius_api_key: req("HELIUS_API_KEY")?,
            mint_address: req("MINT_ADDRESS")?,
            fixed_wallet: req("FIXED_WALLET")?,
            database_url: req("DATABASE_URL")?,
            interval_seconds: num_u64("INTERVAL_SECONDS", 300)?.max(30),
            min_hold_tokens: decimal("MIN_HOLD_TOKENS", Decimal::ZERO)?,
            max_payout_sol_per_cycle: decimal("MAX_PAYOUT_SOL_PER_CYCLE", Decimal::from(50))?,
            telegram_bot_token: opt("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: opt("TELEGRAM_CHAT_ID"),
            dry_run: boolean("DRY_RUN", false),
            dry_run_claim_lamports: num_u128("DRY_RUN_CLAIM_LAMPORTS", 0)?,
            winner_count: WINNER_COUNT,
            split_table,
            prize_table,
        })
    }

    pub fn telegram_enabled(&self) -> bool {
        !self.telegram_bot_token.is_empty() && !self.telegram_chat_id.is_empty()
    }
}
