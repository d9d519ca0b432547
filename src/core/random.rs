/// Injectable random sources for rule selection.
///
/// The engine never reaches for ambient randomness: every source is either
/// handed in by the caller or constructed locally from a seed.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniform samples in `[0, 1)`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

/// Any zero-argument closure returning `[0, 1)` samples is a source.
impl<F> RandomSource for F
where
    F: FnMut() -> f64,
{
    fn next_f64(&mut self) -> f64 {
        self()
    }
}

/// `rand`'s standard generator behind the [`RandomSource`] interface.
#[derive(Debug, Clone)]
pub struct StdRandom(StdRng);

impl StdRandom {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    /// A non-reproducible source seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::seeded(0)
    }
}

impl RandomSource for StdRandom {
    fn next_f64(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// The 32-bit mulberry generator used by the browser tools, so a text seed
/// typed there reproduces the same plant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(seed_from_text(text))
    }
}

impl RandomSource for Mulberry32 {
    fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let t = self.state;
        let mut r = (t ^ (t >> 15)).wrapping_mul(1 | t);
        r ^= r.wrapping_add((r ^ (r >> 7)).wrapping_mul(61 | r));
        f64::from(r ^ (r >> 14)) / 4_294_967_296.0
    }
}

/// djb2 over the UTF-16 code units of `text`.
pub fn seed_from_text(text: &str) -> u32 {
    text.encode_utf16().fold(5381u32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_add(hash)
            .wrapping_add(u32::from(unit))
    })
}

/// Replays a fixed list of samples, wrapping around at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceSource {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceSource {
    /// An empty list behaves like `constant(0.0)`.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of samples drawn so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for SequenceSource {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            self.cursor += 1;
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}
