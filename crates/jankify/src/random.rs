//! Injectable randomness.
//!
//! Every random draw in the pass goes through [`RandomSource`], so a seeded
//! source reproduces the same mesh bit for bit.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::mesh::VertexId;

/// A stream of uniform values in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f32;
}

impl<S: RandomSource + ?Sized> RandomSource for &mut S {
    fn next_unit(&mut self) -> f32 {
        (**self).next_unit()
    }
}

/// Adapts any [`rand::Rng`] into a [`RandomSource`].
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl RngSource<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f32 {
        self.0.r#gen::<f32>()
    }
}

/// Replays a fixed sequence of draws, cycling when exhausted.
///
/// Values are clamped into `[0, 1)`. An empty sequence is a bug in the
/// caller: debug builds panic, release builds draw 0.0 forever.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<f32>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(values: impl Into<Vec<f32>>) -> Self {
        let values: Vec<f32> = values.into();
        debug_assert!(!values.is_empty(), "ScriptedSource needs at least one value");
        let values = if values.is_empty() { vec![0.0] } else { values };
        Self { values, cursor: 0 }
    }

    /// Number of draws made so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f32 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value.clamp(0.0, 1.0 - f32::EPSILON)
    }
}

/// Independent stream for one vertex, derived from a pass seed.
///
/// Streams depend only on `(seed, vertex)`, so vertices can be evaluated in
/// any order or in parallel and still draw the same values.
pub fn vertex_source(seed: u64, vertex: VertexId) -> RngSource<StdRng> {
    RngSource::seeded(splitmix64(seed ^ splitmix64(vertex.0 as u64)))
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
