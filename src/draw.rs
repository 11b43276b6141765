//! Injectable random draw source for bucketing.
//!
//! The controller never reaches for the platform RNG directly; it draws
//! through this trait so tests and replay tooling can script the sequence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform random integers in `[1, 100]` inclusive.
pub trait TrafficDraw {
    fn draw(&mut self) -> u8;
}

impl<D: TrafficDraw + ?Sized> TrafficDraw for &mut D {
    fn draw(&mut self) -> u8 {
        (**self).draw()
    }
}

// ---------------------------------------------------------------------------
// ThreadRngDraw — production source
// ---------------------------------------------------------------------------

/// Draws from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngDraw;

impl TrafficDraw for ThreadRngDraw {
    fn draw(&mut self) -> u8 {
        rand::thread_rng().gen_range(1..=100)
    }
}

// ---------------------------------------------------------------------------
// SeededDraw — reproducible source for the simulator
// ---------------------------------------------------------------------------

/// Draws from a seeded RNG so a simulation run can be replayed exactly.
#[derive(Debug, Clone)]
pub struct SeededDraw {
    rng: StdRng,
}

impl SeededDraw {
    pub fn new(seed: u64) -> Self {
        SeededDraw {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl TrafficDraw for SeededDraw {
    fn draw(&mut self) -> u8 {
        self.rng.gen_range(1..=100)
    }
}

// ---------------------------------------------------------------------------
// SequenceDraw — scripted source for tests
// ---------------------------------------------------------------------------

/// Replays a fixed sequence of draws, then repeats the final value.
#[derive(Debug, Clone)]
pub struct SequenceDraw {
    values: Vec<u8>,
    next: usize,
}

impl SequenceDraw {
    /// `values` must be non-empty and each value must lie in `[1, 100]`.
    pub fn new(values: Vec<u8>) -> Self {
        debug_assert!(!values.is_empty());
        debug_assert!(values.iter().all(|v| (1..=100).contains(v)));
        SequenceDraw { values, next: 0 }
    }

    /// Number of draws consumed so far.
    pub fn consumed(&self) -> usize {
        self.next
    }
}

impl TrafficDraw for SequenceDraw {
    fn draw(&mut self) -> u8 {
        let idx = self.next.min(self.values.len() - 1);
        self.next += 1;
        self.values[idx]
    }
}
