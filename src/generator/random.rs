use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Source of uniform samples in `[0, 1)` used to build synthetic fixtures.
#[cfg_attr(test, mockall::automock)]
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

/// Reproducible source backed by a seeded `SmallRng`.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: SmallRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Uniform index in `0..len`. `len` must be non-zero.
pub fn pick_index(rng: &mut dyn RandomSource, len: usize) -> usize {
    ((rng.next_f64() * len as f64).floor() as usize).min(len - 1)
}

/// `0x` followed by 40 lowercase hex digits, shaped like an account address.
pub fn random_address(rng: &mut dyn RandomSource) -> String {
    let mut address = String::with_capacity(42);
    address.push_str("0x");
    for _ in 0..40 {
        let digit = pick_index(rng, 16) as u32;
        address.push(char::from_digit(digit, 16).unwrap_or('0'));
    }
    address
}
