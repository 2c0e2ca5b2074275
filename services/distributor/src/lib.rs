//! Creator-fee raffle distributor.
//!
//! Once per interval the distributor claims accrued creator fees, takes
//! a hashed snapshot of token holders, draws ten weighted winners from a
//! seed derived from the claim reference and the snapshot hash, splits
//! the claimed amount 50/50 between a fixed wallet and the raffle, and
//! pays the raffle share out by rank. All amounts are exact integer
//! lamports; the draw is replayable by anyone from the recorded seed.
//!
//! The engine (`fee-raffle-engine`) is pure; everything I/O-shaped goes
//! through the collaborator traits in [`ports`], so the cycle can be
//! exercised end to end against in-memory doubles.

pub mod config;
pub mod cycle;
pub mod helius;
pub mod payout;
pub mod ports;
pub mod sim;
pub mod store;
pub mod telegram;

pub use config::{Config, ConfigError};
pub use cycle::{run_cycle, Collaborators, CycleOutcome};
