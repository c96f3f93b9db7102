//! Pseudo-random engine used by all samplers.
//!
//! A thin wrapper over `XorShiftRng` exposing the two draws the samplers
//! need: a uniform integer below a bound and a uniform float on `[0, 1)`.
//! Each worker thread owns its own engine (see
//! [`RandomEngine::with_thread_local`]), so parallel sampling never shares a
//! stream; results are deterministic per (seed, inputs).

use std::cell::RefCell;

use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

const DEFAULT_SEED: u64 = 0x5b7f_95e1_d0f3_42c7;

thread_local! {
    static ENGINE: RefCell<RandomEngine> = RefCell::new(RandomEngine::new(DEFAULT_SEED));
}

/// A seedable source of uniform ints and floats.
#[derive(Debug, Clone)]
pub struct RandomEngine {
    rng: XorShiftRng,
}

impl RandomEngine {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: XorShiftRng::seed_from_u64(seed),
        }
    }

    /// Uniform integer in `[0, upper)`. `upper` must be positive.
    pub fn rand_int(&mut self, upper: usize) -> usize {
        self.rng.random_range(0..upper)
    }

    /// Uniform float in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.random()
    }

    /// Run `f` with this thread's engine.
    pub fn with_thread_local<R>(f: impl FnOnce(&mut RandomEngine) -> R) -> R {
        ENGINE.with(|engine| f(&mut engine.borrow_mut()))
    }

    /// Reset this thread's engine to a known state.
    pub fn seed_thread_local(seed: u64) {
        ENGINE.with(|engine| *engine.borrow_mut() = RandomEngine::new(seed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let mut rng = RandomEngine::new(7);
        for _ in 0..1000 {
            assert!(rng.rand_int(10) < 10);
            let x = rng.uniform();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = RandomEngine::new(42);
        let mut b = RandomEngine::new(42);
        let xs: Vec<usize> = (0..32).map(|_| a.rand_int(1000)).collect();
        let ys: Vec<usize> = (0..32).map(|_| b.rand_int(1000)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_thread_local_reseed() {
        RandomEngine::seed_thread_local(99);
        let first = RandomEngine::with_thread_local(|rng| rng.rand_int(1_000_000));
        RandomEngine::seed_thread_local(99);
        let second = RandomEngine::with_thread_local(|rng| rng.rand_int(1_000_000));
        assert_eq!(first, second);
    }
}
