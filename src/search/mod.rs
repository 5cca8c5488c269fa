//! Hyperparameter search space and samplers
//!
//! A [`SearchSpace`] is an ordered, validated set of parameter
//! descriptors. A [`Sampler`] draws one candidate per call,
//! independently of search progress, so any strategy (random, grid,
//! Bayesian, ...) can sit behind the same contract.

mod sampler;
mod space;

pub use sampler::{create_sampler, GridSampler, RandomSampler, Sampler, SamplerType};
pub use space::{ParamKind, ParamValue, Parameter, SearchSpace, SearchSpaceBuilder, TrialParams};
