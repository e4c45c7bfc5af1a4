//! Deterministic hashing and pseudo-random draws for the heuristic feature slots.
//!
//! Feature values derived from these primitives are baked into already-trained
//! artifacts, so the algorithms are written out here instead of relying on
//! `std::hash` or `rand::rngs::StdRng`, neither of which promises stable output
//! across releases.

use rand::{Error, RngCore, SeedableRng};
use std::f64::consts::PI;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over the UTF-8 bytes of `input`.
pub fn fnv1a64(input: &str) -> u64 {
    input.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Hash bucket in `[0, 1)`: `(fnv1a64(input) mod 1000) / 1000`.
pub fn hash_bucket(input: &str) -> f64 {
    (fnv1a64(input) % 1000) as f64 / 1000.0
}

/// SplitMix64 generator (Steele, Lea & Flood 2014).
#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }
}

impl RngCore for SplitMix64 {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for SplitMix64 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

/// Uniform draw in `[0, 1)` from the top 53 bits of one `u64`.
pub fn unit_f64<R: RngCore>(rng: &mut R) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Normal draw via the Box-Muller cosine branch. Consumes exactly two `u64`s.
pub fn normal<R: RngCore>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    // u1 in (0, 1] keeps ln() finite
    let u1 = 1.0 - unit_f64(rng);
    let u2 = unit_f64(rng);
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    mean + std_dev * z
}
