/// A deterministic, restartable stream of values in `[0, 1)`.
///
/// The seed is public, so cryptographic strength is not required; the
/// property that matters is that the same seed yields the identical
/// infinite sequence on every platform and every run. Kept behind a
/// trait so the selector can be exercised with scripted sequences.
pub trait SeedSequence {
    /// Next value in `[0, 1)`.
    fn advance(&mut self) -> f64;
}

/// Reference sequence: the seed bytes are folded through 32-bit FNV-1a,
/// and each draw advances the state with a 13/17/5 xorshift before
/// mapping to `[0, 1)` by division by 2^32.
#[derive(Debug, Clone)]
pub struct XorShiftSequence {
    state: u32,
}

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 16_777_619;

impl XorShiftSequence {
    pub fn from_seed(seed: &str) -> Self {
        let mut state = FNV_OFFSET_BASIS;
        for byte in seed.bytes() {
            state ^= u32::from(byte);
            state = state.wrapping_mul(FNV_PRIME);
        }
        Self { state }
    }
}

impl SeedSequence for XorShiftSequence {
    fn advance(&mut self) -> f64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        f64::from(x) / 4_294_967_296.0
    }
}
