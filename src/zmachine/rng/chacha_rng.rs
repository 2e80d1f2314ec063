use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::ZRng;

/// [ZRng] backed by ChaCha8
pub struct ChaChaRng {
    rng: ChaCha8Rng,
}

impl Default for ChaChaRng {
    fn default() -> Self {
        ChaChaRng::new()
    }
}

impl ChaChaRng {
    /// Constructor, seeded from entropy
    pub fn new() -> ChaChaRng {
        ChaChaRng {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Constructor for a reproducible sequence
    ///
    /// # Arguments
    /// * `seed` - seed value
    pub fn seeded(seed: u64) -> ChaChaRng {
        ChaChaRng {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl ZRng for ChaChaRng {
    fn type_name(&self) -> &str {
        "ChaChaRng"
    }

    fn seed(&mut self, seed: u16) {
        if seed == 0 {
            self.rng = ChaCha8Rng::from_entropy();
        } else {
            self.rng = ChaCha8Rng::seed_from_u64(seed as u64)
        }
    }

    fn random(&mut self, range: u16) -> u16 {
        self.rng.gen_range(1..=u16::max(range, 1))
    }
}
