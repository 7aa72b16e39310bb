//! Random number generation, on top of the rand crate

use crate::numeric::Float;
use rand::{Rng, SeedableRng};

// Select random number generation engine in use
#[cfg(feature = "f32")]
type Engine = rand_xoshiro::Xoshiro128Plus;
#[cfg(not(feature = "f32"))]
type Engine = rand_xoshiro::Xoshiro256Plus;

/// Seeded random number generator used by the event generator
#[derive(Clone)]
pub struct RandomGenerator {
    rng: Engine,
}
//
impl RandomGenerator {
    /// Spawn a new random number generator
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Engine::seed_from_u64(seed),
        }
    }

    /// Generate a random floating-point number between 0 and 1
    pub fn random(&mut self) -> Float {
        self.rng.gen()
    }

    /// Generate a random floating-point number between min and max
    pub fn uniform(&mut self, min: Float, max: Float) -> Float {
        min + (max - min) * self.random()
    }

    /// Generate a random integer in [0, max)
    pub fn below(&mut self, max: u32) -> u32 {
        self.rng.gen_range(0..max)
    }

    /// Generate a random boolean which is true with a given probability
    pub fn chance(&mut self, probability: Float) -> bool {
        self.random() < probability
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut rng1 = RandomGenerator::new(42);
        let mut rng2 = RandomGenerator::new(42);
        for _ in 0..16 {
            assert_eq!(rng1.random(), rng2.random());
        }
    }

    #[test]
    fn ranges_are_respected() {
        let mut rng = RandomGenerator::new(7);
        for _ in 0..1000 {
            let x = rng.uniform(-2., 3.);
            assert!((-2. ..3.).contains(&x));
            assert!(rng.below(5) < 5);
        }
        assert!(!rng.chance(0.));
    }
}
