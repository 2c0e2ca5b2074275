use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Zero eligible holders. A legitimate, non-fatal outcome that
    /// short-circuits a cycle before the raffle runs.
    #[error("zero eligible holders in snapshot")]
    EmptySnapshot,

    /// The pool ran out of distinct candidates before all slots were
    /// filled. Winners already drawn are discarded, never partially paid.
    #[error("not enough eligible holders: picked {obtained} of {required}")]
    InsufficientCandidates { obtained: usize, required: usize },

    /// Remaining pool weight was not positive before a required draw.
    #[error("total weight of remaining pool is zero")]
    DegenerateWeight,

    /// A share table failed startup validation. Configuration error,
    /// never raised per cycle.
    #[error("share table must sum to 10000 bps (got {sum})")]
    InvalidShareTable { sum: u32 },
}
