// THEORY:
// The `hashing` module is the root of every reproducible decision the engine
// makes. Nothing here knows about faces, colors or images; it only turns bytes
// into integers and integers into sequences.
//
// Key architectural principles:
// 1.  **Platform Stability**: `hash` is a 31-multiplier polynomial over raw
//     bytes in wrapping 32-bit signed arithmetic. No floats, no locale, no
//     pointer-width dependence, so the same photo yields the same seed
//     everywhere.
// 2.  **Stateful but Isolated Randomness**: `SeededRng` is a Mulberry32 mixer.
//     Each instance owns its 32-bit state; two instances built from the same
//     seed walk bit-identical sequences.
// 3.  **Non-Mutating Shuffle**: `seeded_shuffle` returns a new permutation and
//     leaves its input untouched, so callers can keep the original ordering
//     around for display.

/// Streaming form of [`hash`]. Feeding the same bytes in any number of
/// `update` calls gives the same result as hashing them in one slice.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolyHasher {
    state: i32,
}

impl PolyHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) -> &mut Self {
        for &byte in bytes {
            self.state = self.state.wrapping_mul(31).wrapping_add(byte as i32);
        }
        self
    }

    /// Absolute value of the signed accumulator. `i32::MIN` maps to `2^31`.
    pub fn finish(&self) -> u32 {
        self.state.unsigned_abs()
    }
}

/// Rolling polynomial hash (`h = h * 31 + byte`, 32-bit wraparound), absolute value.
pub fn hash(bytes: impl AsRef<[u8]>) -> u32 {
    PolyHasher::new().update(bytes.as_ref()).finish()
}

/// Mulberry32 generator producing floats in `[0, 1)`.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Raw 32-bit output of one mixing round.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = (self.state ^ (self.state >> 15)).wrapping_mul(1 | self.state);
        t = t.wrapping_add((t ^ (t >> 7)).wrapping_mul(61 | t)) ^ t;
        t ^ (t >> 14)
    }

    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / 4_294_967_296.0
    }
}

impl Iterator for SeededRng {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_f64())
    }
}

/// Fisher-Yates over a copy of `items`, driven by `SeededRng::new(seed)`.
pub fn seeded_shuffle<T: Clone>(items: &[T], seed: u32) -> Vec<T> {
    let mut shuffled = items.to_vec();
    let mut rng = SeededRng::new(seed);
    for i in (1..shuffled.len()).rev() {
        let j = (rng.next_f64() * (i + 1) as f64).floor() as usize;
        shuffled.swap(i, j.min(i));
    }
    shuffled
}
