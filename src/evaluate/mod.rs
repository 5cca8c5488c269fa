//! Walk-forward objective evaluation
//!
//! Trials are scored under walk-forward cross-validation so no fold
//! ever trains on data from its own future. Full-dataset evaluation
//! produces the performance snapshots used for promotion baselines and
//! continuous monitoring.

mod evaluator;
mod folds;

pub use evaluator::{ObjectiveEvaluator, TrialContext};
pub use folds::{walk_forward, FoldSplit};
