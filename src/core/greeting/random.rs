// Uniform draw source for the composition pipeline. Production code wraps a
// real RNG; tests script the exact sequence of outcomes, which keeps every
// randomized branch of the composer replayable.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait RandomDraws: Send {
    /// True with the given probability.
    fn chance(&mut self, probability: f64) -> bool;

    /// Uniform index into a collection of `len` items. `len` must be > 0.
    fn pick_index(&mut self, len: usize) -> usize;

    /// Uniform integer in `[0, upper)`, for jittered delays. Zero when
    /// `upper` is zero.
    fn jitter(&mut self, upper: u64) -> u64;
}

/// `rand`-backed draw source. `StdRng` rather than `thread_rng` so draws
/// stay `Send` across await points.
pub struct StdDraws {
    rng: StdRng,
}

impl StdDraws {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    #[allow(dead_code)]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomDraws for StdDraws {
    fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen::<f64>() < probability
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    fn jitter(&mut self, upper: u64) -> u64 {
        if upper == 0 {
            return 0;
        }
        self.rng.gen_range(0..upper)
    }
}
