//! Deterministic weighted raffle and proportional allocation engine.
//!
//! Every function in this crate is a pure computation over materialized
//! inputs: no I/O, no clocks, no shared state. A cycle supplies its own
//! seed and its own snapshot, so any past cycle can be replayed offline
//! from the recorded seed and raw balance records and must reproduce the
//! same winners and the same amounts.

pub mod allocate;
pub mod error;
pub mod selector;
pub mod sequence;
pub mod snapshot;
pub mod types;

pub use allocate::{allocate, ShareTable};
pub use error::EngineError;
pub use selector::{compute_weight, pick_winners};
pub use sequence::{SeedSequence, XorShiftSequence};
pub use snapshot::build_snapshot;
pub use types::{BalanceRecord, Holder, Snapshot, Winner};
