//! Candidate samplers

use super::space::{ParamKind, ParamValue, SearchSpace, TrialParams};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Draws one candidate per call.
///
/// Draws are independent of search progress: a sampler never observes
/// trial scores, so strategies stay interchangeable behind this trait.
pub trait Sampler: Send + Sync {
    fn sample(&self, space: &SearchSpace) -> TrialParams;
}

/// Sampler strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplerType {
    Random,
    Grid,
}

/// Build a sampler from its type tag.
pub fn create_sampler(sampler: SamplerType, seed: Option<u64>) -> Box<dyn Sampler> {
    match sampler {
        SamplerType::Random => Box::new(RandomSampler::new(seed)),
        SamplerType::Grid => Box::new(GridSampler::new(8)),
    }
}

/// Uniform random sampler with an optional fixed seed
pub struct RandomSampler {
    rng: Mutex<ChaCha8Rng>,
}

impl RandomSampler {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl Sampler for RandomSampler {
    fn sample(&self, space: &SearchSpace) -> TrialParams {
        let mut rng = self.rng.lock();
        let mut params = TrialParams::new();
        for param in space.params() {
            params.insert(param.name.clone(), param.kind.draw(&mut *rng));
        }
        params
    }
}

/// Even grid over every parameter; walks the cartesian product and
/// wraps around once exhausted.
pub struct GridSampler {
    resolution: usize,
    cursor: AtomicUsize,
}

impl GridSampler {
    /// `resolution` is the number of points per numeric axis.
    pub fn new(resolution: usize) -> Self {
        Self {
            resolution: resolution.max(2),
            cursor: AtomicUsize::new(0),
        }
    }

    fn axis_len(&self, kind: &ParamKind) -> usize {
        match kind {
            ParamKind::Categorical { choices } => choices.len(),
            ParamKind::IntRange { low, high } => {
                (high - low + 1).min(self.resolution as i64) as usize
            }
            ParamKind::FloatRange { .. } => self.resolution,
        }
    }

    fn value_at(&self, kind: &ParamKind, index: usize) -> ParamValue {
        let n = self.axis_len(kind);
        match kind {
            ParamKind::Categorical { choices } => ParamValue::Text(choices[index].clone()),
            ParamKind::IntRange { low, high } => {
                let step = (high - low) as f64 * index as f64 / (n - 1) as f64;
                ParamValue::Int(low + step.round() as i64)
            }
            ParamKind::FloatRange { low, high } => {
                ParamValue::Float(low + (high - low) * index as f64 / (n - 1) as f64)
            }
        }
    }
}

impl Sampler for GridSampler {
    fn sample(&self, space: &SearchSpace) -> TrialParams {
        let total: usize = space
            .params()
            .iter()
            .map(|p| self.axis_len(&p.kind))
            .product::<usize>()
            .max(1);
        let mut index = self.cursor.fetch_add(1, Ordering::Relaxed) % total;

        let mut params = TrialParams::new();
        for param in space.params() {
            let n = self.axis_len(&param.kind);
            params.insert(param.name.clone(), self.value_at(&param.kind, index % n));
            index /= n;
        }
        params
    }
}
