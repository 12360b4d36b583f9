//! Shuffle selection
//!
//! Shuffle does not reorder the queue. When shuffle is on, `next` jumps to a
//! random index that differs from the current one.

use rand::{Rng, RngCore};

/// Pick a random index in `0..len` that differs from `current`
///
/// Draws up to `attempts` times. If every draw lands on `current`, falls back
/// to the following index (wrapping). A single-entry queue always yields 0.
pub fn pick_other_index(rng: &mut dyn RngCore, len: usize, current: usize, attempts: u32) -> usize {
    if len <= 1 {
        return 0;
    }

    for _ in 0..attempts {
        let candidate = rng.gen_range(0..len);
        if candidate != current {
            return candidate;
        }
    }

    (current + 1) % len
}
