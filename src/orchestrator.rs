//! Budgeted hyperparameter search over independent trials

use crate::dataset::Dataset;
use crate::error::{AutoForecastError, Result};
use crate::evaluate::{ObjectiveEvaluator, TrialContext};
use crate::model::{ModelFactory, TrainableModel};
use crate::monitor::PerformanceSnapshot;
use crate::search::{Sampler, SearchSpace, TrialParams};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Limits for one search run; whichever bound is hit first ends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBudget {
    /// Maximum number of trials submitted
    pub max_trials: usize,
    /// Wall-clock limit for the whole run; in-flight trials finish but
    /// no new ones are submitted once it elapses
    pub max_wall_clock: Option<Duration>,
    /// Per-trial limit; an over-budget trial scores as failed
    pub trial_timeout: Option<Duration>,
}

impl Default for TrialBudget {
    fn default() -> Self {
        Self {
            max_trials: 50,
            max_wall_clock: None,
            trial_timeout: None,
        }
    }
}

impl TrialBudget {
    pub fn new(max_trials: usize) -> Self {
        Self {
            max_trials,
            ..Self::default()
        }
    }

    pub fn with_max_wall_clock(mut self, limit: Duration) -> Self {
        self.max_wall_clock = Some(limit);
        self
    }

    pub fn with_trial_timeout(mut self, limit: Duration) -> Self {
        self.trial_timeout = Some(limit);
        self
    }
}

/// Lifecycle of one trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    Pending,
    Running,
    Scored,
    Failed,
}

/// One sampled-and-scored candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial {
    pub id: usize,
    pub params: TrialParams,
    pub status: TrialStatus,
    /// Loss, lower is better; +INF when the trial failed
    pub score: f64,
    pub duration: Duration,
}

/// Report of one finished search run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub name: String,
    pub best_params: TrialParams,
    pub best_score: f64,
    /// Full-dataset snapshot of the refit winner
    pub performance: PerformanceSnapshot,
    pub trial_count: usize,
    /// Ordered trial log, for replay and audit
    pub trials: Vec<Trial>,
}

/// A finished search: the refit winner plus its report
pub struct SearchOutcome {
    pub model: Box<dyn TrainableModel>,
    pub report: OptimizationResult,
}

impl std::fmt::Debug for SearchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOutcome")
            .field("model", &self.model.family())
            .field("report", &self.report)
            .finish()
    }
}

/// Runs a budgeted sequence of trials and tracks the best candidate.
///
/// Trials are independent and run on a bounded worker pool; the live
/// best tracker is updated under a single lock, and the returned winner
/// is re-derived from the id-ordered trial log so ties deterministically
/// keep the earlier trial whatever the completion order was.
pub struct SearchOrchestrator {
    sampler: Arc<dyn Sampler>,
    evaluator: ObjectiveEvaluator,
    n_workers: usize,
}

impl SearchOrchestrator {
    pub fn new(sampler: Arc<dyn Sampler>, evaluator: ObjectiveEvaluator) -> Self {
        Self {
            sampler,
            evaluator,
            n_workers: 0,
        }
    }

    /// Bound the trial worker pool; 0 uses the default pool size.
    pub fn with_workers(mut self, n_workers: usize) -> Self {
        self.n_workers = n_workers;
        self
    }

    pub fn run(
        &self,
        name: &str,
        dataset: &Dataset,
        space: &SearchSpace,
        factory: &dyn ModelFactory,
        budget: &TrialBudget,
    ) -> Result<SearchOutcome> {
        if budget.max_trials == 0 {
            return Err(AutoForecastError::Validation(
                "budget must allow at least one trial".to_string(),
            ));
        }

        let start = Instant::now();
        let best: Mutex<Option<(usize, f64)>> = Mutex::new(None);

        let run_one = |id: usize| -> Option<Trial> {
            if let Some(limit) = budget.max_wall_clock {
                if start.elapsed() >= limit {
                    return None;
                }
            }
            let params = self.sampler.sample(space);
            let trial_start = Instant::now();
            let ctx = TrialContext {
                dataset,
                params: &params,
            };
            let outcome = self.evaluator.evaluate(factory, &ctx);
            let duration = trial_start.elapsed();
            let timed_out = budget.trial_timeout.map_or(false, |limit| duration > limit);

            let trial = match outcome {
                Ok(score) if !timed_out => {
                    let mut guard = best.lock();
                    let improved = match *guard {
                        None => true,
                        Some((_, best_score)) => score < best_score,
                    };
                    if improved {
                        *guard = Some((id, score));
                        info!(trial = id, score, "new best trial");
                    }
                    drop(guard);
                    debug!(trial = id, score, "trial scored");
                    Trial {
                        id,
                        params,
                        status: TrialStatus::Scored,
                        score,
                        duration,
                    }
                }
                Ok(_) => {
                    warn!(trial = id, ?duration, "trial exceeded its timeout, scoring as failed");
                    Trial {
                        id,
                        params,
                        status: TrialStatus::Failed,
                        score: f64::INFINITY,
                        duration,
                    }
                }
                Err(e) => {
                    warn!(trial = id, error = %e, "trial failed");
                    Trial {
                        id,
                        params,
                        status: TrialStatus::Failed,
                        score: f64::INFINITY,
                        duration,
                    }
                }
            };
            Some(trial)
        };

        let raw: Vec<Option<Trial>> = if self.n_workers == 1 {
            (0..budget.max_trials).map(&run_one).collect()
        } else if self.n_workers == 0 {
            (0..budget.max_trials).into_par_iter().map(&run_one).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.n_workers)
                .build()
                .map_err(|e| AutoForecastError::Validation(format!("worker pool: {e}")))?;
            pool.install(|| (0..budget.max_trials).into_par_iter().map(&run_one).collect())
        };
        let trials: Vec<Trial> = raw.into_iter().flatten().collect();

        // Winner from the ordered log: strict improvement only, so ties
        // keep the earliest trial.
        let mut best_idx: Option<usize> = None;
        for (idx, trial) in trials.iter().enumerate() {
            if trial.status != TrialStatus::Scored {
                continue;
            }
            match best_idx {
                None => best_idx = Some(idx),
                Some(current) if trial.score < trials[current].score => best_idx = Some(idx),
                _ => {}
            }
        }
        let Some(best_idx) = best_idx else {
            warn!(name, trials = trials.len(), "search ended with no successful trial");
            return Err(AutoForecastError::SearchExhausted(name.to_string()));
        };

        let best_params = trials[best_idx].params.clone();
        let best_score = trials[best_idx].score;

        // Refit on the entire dataset; fold-trained instances saw less.
        let mut model = factory.build(&best_params)?;
        model.fit(dataset.features(), dataset.targets())?;
        let performance = self.evaluator.full_evaluate(model.as_ref(), dataset);

        info!(
            name,
            best_score,
            trial_count = trials.len(),
            elapsed = ?start.elapsed(),
            "search complete"
        );
        Ok(SearchOutcome {
            model,
            report: OptimizationResult {
                name: name.to_string(),
                best_params,
                best_score,
                performance,
                trial_count: trials.len(),
                trials,
            },
        })
    }
}
