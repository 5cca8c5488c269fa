//! Autoforecast - continuous AutoML for time-series forecasting
//!
//! This crate automates the lifecycle of forecasting models: searching
//! hyperparameters under a budget, promoting the best candidate into a
//! registry, and re-evaluating deployed models against fresh data to
//! decide when to retrain.
//!
//! # Modules
//!
//! ## Search
//! - [`search`] - Search spaces, parameter descriptors and samplers
//! - [`evaluate`] - Walk-forward cross-validation and scoring
//! - [`orchestrator`] - Budgeted trial runs with a bounded worker pool
//!
//! ## Lifecycle
//! - [`registry`] - Promoted models, one live record per name
//! - [`monitor`] - Performance history, trends, degradation detection
//! - [`controller`] - Continuous learning over registered models
//! - [`ensemble`] - Weighted aggregation across registered models
//!
//! ## Contracts
//! - [`model`] - Trainable-model and factory traits
//! - [`dataset`] - Time-ordered feature/target carrier
//! - [`error`] - Crate-wide error type

pub mod controller;
pub mod dataset;
pub mod ensemble;
pub mod error;
pub mod evaluate;
pub mod model;
pub mod monitor;
pub mod orchestrator;
pub mod registry;
pub mod search;

pub use error::{AutoForecastError, Result};

/// Re-export of the commonly used types
pub mod prelude {
    pub use crate::controller::{
        ContinuousLearner, JobStatus, LearnerConfig, ModelStatus, RetrainingJob, RetrainingReport,
    };
    pub use crate::dataset::Dataset;
    pub use crate::ensemble::WeightedEnsemble;
    pub use crate::error::{AutoForecastError, Result};
    pub use crate::evaluate::{walk_forward, FoldSplit, ObjectiveEvaluator, TrialContext};
    pub use crate::model::{
        ModelFactory, ModelFactorySet, RidgeFactory, RidgeForecaster, TrainableModel,
        RIDGE_FAMILY,
    };
    pub use crate::monitor::{PerformanceMonitor, PerformanceSnapshot, Trend, TrendReport};
    pub use crate::orchestrator::{
        OptimizationResult, SearchOrchestrator, SearchOutcome, Trial, TrialBudget, TrialStatus,
    };
    pub use crate::registry::{ModelRecord, ModelRegistry};
    pub use crate::search::{
        create_sampler, GridSampler, ParamKind, ParamValue, Parameter, RandomSampler, Sampler,
        SamplerType, SearchSpace, TrialParams,
    };
}
