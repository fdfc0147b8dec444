//! Deterministic dataset generation
use crate::types::RunningTotal;
use log::debug;
use rand::RngCore;

const STATE_SIZE: usize = 624;
const SHIFT_SIZE: usize = 397;
const MATRIX_A: u32 = 0x9908_b0df;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;

/// Seed used by an unseeded MT19937
pub const DEFAULT_SEED: u32 = 5489;

/// 32-bit Mersenne Twister (MT19937).
///
/// [`Mt19937::default`] starts from [`DEFAULT_SEED`], so an unseeded generator
/// produces the same stream on every run and on every platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mt19937 {
    state: Box<[u32; STATE_SIZE]>,
    index: usize,
}

impl Mt19937 {
    /// Create a generator from a seed
    pub fn new(seed: u32) -> Self {
        let mut state = Box::new([0u32; STATE_SIZE]);
        state[0] = seed;
        for i in 1..STATE_SIZE {
            let previous = state[i - 1];
            state[i] = 1_812_433_253u32
                .wrapping_mul(previous ^ (previous >> 30))
                .wrapping_add(i as u32);
        }
        Self {
            state,
            index: STATE_SIZE,
        }
    }

    fn twist(&mut self) {
        for i in 0..STATE_SIZE {
            let y = (self.state[i] & UPPER_MASK)
                | (self.state[(i + 1) % STATE_SIZE] & LOWER_MASK);
            let mut next = self.state[(i + SHIFT_SIZE) % STATE_SIZE] ^ (y >> 1);
            if y & 1 != 0 {
                next ^= MATRIX_A;
            }
            self.state[i] = next;
        }
        self.index = 0;
    }
}

impl Default for Mt19937 {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl RngCore for Mt19937 {
    fn next_u32(&mut self) -> u32 {
        if self.index >= STATE_SIZE {
            self.twist();
        }
        let mut y = self.state[self.index];
        self.index += 1;

        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^ (y >> 18)
    }

    fn next_u64(&mut self) -> u64 {
        let low = u64::from(self.next_u32());
        let high = u64::from(self.next_u32());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// The full value set together with its checksum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    /// The values, in generation order
    pub values: Vec<u32>,
    /// Wrapping sum of all values
    pub expected_total: RunningTotal,
}

/// Generate `count` values from an unseeded Mersenne Twister
pub fn generate(count: usize) -> Dataset {
    generate_with(&mut Mt19937::default(), count)
}

/// Generate `count` values from `rng`, summing them as they are drawn
pub fn generate_with<R: RngCore + ?Sized>(rng: &mut R, count: usize) -> Dataset {
    let mut values = Vec::with_capacity(count);
    let mut expected_total: RunningTotal = 0;
    for _ in 0..count {
        let value = rng.next_u32();
        values.push(value);
        expected_total = expected_total.wrapping_add(u64::from(value));
    }
    debug!("Generated {count} values, expected total {expected_total}");
    Dataset {
        values,
        expected_total,
    }
}
