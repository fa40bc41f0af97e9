// Deterministic sampling primitives. Every "random" choice in puzzle
// construction flows through these, so a (day, mode) pair replays to the same
// puzzle on any host. Swapping the stream would silently change every daily
// puzzle, which is why nothing here delegates to a PRNG crate.

// xorshift has a fixed point at zero, so a zero seed is replaced with this.
const ZERO_SEED_FALLBACK: u32 = 0x9e37_79b9;

/// 32-bit FNV-1a over the character codes of `text`.
pub fn seed(text: &str) -> u32 {
    let mut hash: u32 = 2_166_136_261;
    for ch in text.chars() {
        hash ^= ch as u32;
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}

fn xorshift(mut state: u32) -> u32 {
    state ^= state << 13;
    state ^= state >> 17;
    state ^= state << 5;
    state
}

/// Fold one xorshift step of `seed` into `[0, len)`.
///
/// `len` must be non-zero; sampling an empty candidate set is a caller bug.
pub fn pick(len: usize, seed: u32) -> usize {
    assert!(len > 0, "pick on an empty candidate set");
    let state = xorshift(if seed == 0 { ZERO_SEED_FALLBACK } else { seed });
    (state as i32).unsigned_abs() as usize % len
}

/// Evolving xorshift stream for decisions that need more than one draw.
pub struct Sampler {
    state: u32,
}

impl Sampler {
    pub fn new(seed: u32) -> Sampler {
        Sampler {
            state: if seed == 0 { ZERO_SEED_FALLBACK } else { seed },
        }
    }

    fn next_index(&mut self, len: usize) -> usize {
        assert!(len > 0, "next_index on an empty candidate set");
        self.state = xorshift(self.state);
        (self.state as i32).unsigned_abs() as usize % len
    }

    /// Fisher-Yates driven by repeated deterministic picks.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_index(i + 1);
            items.swap(i, j);
        }
    }
}
