//! Continuous learning over registered models
//!
//! On each batch of fresh data every registered model is re-scored; the
//! ones that degraded past their promotion baseline are retrained
//! through a fresh search scoped to the space they were registered
//! with, and the winners replace their registry records. Per-model
//! failures are reported, never raised, so one bad model cannot stall
//! the rest of the fleet.

use crate::dataset::Dataset;
use crate::ensemble::WeightedEnsemble;
use crate::error::{AutoForecastError, Result};
use crate::evaluate::ObjectiveEvaluator;
use crate::model::ModelFactorySet;
use crate::monitor::{PerformanceMonitor, PerformanceSnapshot, TrendReport};
use crate::orchestrator::{OptimizationResult, SearchOrchestrator, TrialBudget};
use crate::registry::{ModelRecord, ModelRegistry};
use crate::search::{create_sampler, SamplerType, SearchSpace};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Tunables for the learning loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerConfig {
    /// Relative mse increase over the promotion baseline that triggers
    /// retraining
    pub degradation_threshold: f64,
    /// Walk-forward folds used when scoring trials
    pub folds: usize,
    /// Snapshot window for trend analysis
    pub trend_window: usize,
    /// Worker pool size for trials (0 = default pool)
    pub n_workers: usize,
    /// Sampling strategy for trials
    pub sampler: SamplerType,
    /// Seed for trial sampling
    pub seed: Option<u64>,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            degradation_threshold: 0.10,
            folds: 5,
            trend_window: 5,
            n_workers: 0,
            sampler: SamplerType::Random,
            seed: Some(42),
        }
    }
}

impl LearnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_degradation_threshold(mut self, threshold: f64) -> Self {
        self.degradation_threshold = threshold;
        self
    }

    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = folds;
        self
    }

    pub fn with_trend_window(mut self, window: usize) -> Self {
        self.trend_window = window;
        self
    }

    pub fn with_workers(mut self, n_workers: usize) -> Self {
        self.n_workers = n_workers;
        self
    }

    pub fn with_sampler(mut self, sampler: SamplerType) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Retraining job state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

/// One retraining attempt for a model name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrainingJob {
    pub model_name: String,
    pub triggered_at: DateTime<Utc>,
    pub status: JobStatus,
}

/// Search scope a managed model was registered with
struct ManagedModel {
    family: String,
    space: SearchSpace,
    budget: TrialBudget,
}

/// Result of one learn cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrainingReport {
    /// Names whose records were replaced this cycle
    pub retrained: Vec<String>,
    /// Names whose retraining was attempted and failed, with the
    /// reason; their previous records stay in place
    pub failed: HashMap<String, String>,
    /// Fresh snapshot of every registered model on the new data
    pub performance_by_name: HashMap<String, PerformanceSnapshot>,
    pub completed_at: DateTime<Utc>,
}

/// Live status of one registered model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub current_performance: PerformanceSnapshot,
    pub trend: TrendReport,
    pub degraded: bool,
    pub last_promoted_at: DateTime<Utc>,
}

/// Owns the model lifecycle: search, promotion, monitoring, retraining.
pub struct ContinuousLearner {
    registry: Arc<ModelRegistry>,
    perf: Arc<PerformanceMonitor>,
    orchestrator: SearchOrchestrator,
    evaluator: ObjectiveEvaluator,
    factories: ModelFactorySet,
    managed: RwLock<HashMap<String, ManagedModel>>,
    jobs: Mutex<HashMap<String, RetrainingJob>>,
    ensemble: Option<Mutex<WeightedEnsemble>>,
    config: LearnerConfig,
}

impl ContinuousLearner {
    pub fn new(factories: ModelFactorySet, config: LearnerConfig) -> Self {
        let evaluator = ObjectiveEvaluator::new(config.folds);
        let sampler = Arc::from(create_sampler(config.sampler, config.seed));
        let orchestrator = SearchOrchestrator::new(sampler, evaluator.clone())
            .with_workers(config.n_workers);
        Self {
            registry: Arc::new(ModelRegistry::new()),
            perf: Arc::new(PerformanceMonitor::new(config.trend_window)),
            orchestrator,
            evaluator,
            factories,
            managed: RwLock::new(HashMap::new()),
            jobs: Mutex::new(HashMap::new()),
            ensemble: None,
            config,
        }
    }

    /// Aggregate the given registered names behind a weighted ensemble.
    /// Its weights are refreshed after any learn cycle that retrained
    /// at least one member.
    pub fn with_ensemble(mut self, members: Vec<String>) -> Self {
        self.ensemble = Some(Mutex::new(WeightedEnsemble::new(members)));
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn performance_monitor(&self) -> &PerformanceMonitor {
        &self.perf
    }

    /// Snapshot of all retraining jobs seen so far.
    pub fn jobs(&self) -> Vec<RetrainingJob> {
        self.jobs.lock().values().cloned().collect()
    }

    /// Search `space` under `budget`, promote the winner under `name`
    /// and register the scope for future retraining.
    pub fn optimize(
        &self,
        name: &str,
        family: &str,
        dataset: &Dataset,
        space: SearchSpace,
        budget: TrialBudget,
    ) -> Result<OptimizationResult> {
        let factory = self.factories.get(family)?;
        let outcome = self
            .orchestrator
            .run(name, dataset, &space, factory.as_ref(), &budget)?;

        let record = ModelRecord {
            name: name.to_string(),
            family: family.to_string(),
            model: Arc::from(outcome.model),
            hyperparams: outcome.report.best_params.clone(),
            score: outcome.report.best_score,
            performance: outcome.report.performance.clone(),
            promoted_at: Utc::now(),
        };
        self.perf.record(name, record.performance.clone());
        self.registry.promote(record);
        self.managed.write().insert(
            name.to_string(),
            ManagedModel {
                family: family.to_string(),
                space,
                budget,
            },
        );
        Ok(outcome.report)
    }

    /// Re-score every registered model on fresh data and retrain the
    /// degraded ones. Failures scoped to one model are reported in the
    /// returned [`RetrainingReport`], never raised.
    pub fn learn(&self, new_data: &Dataset) -> Result<RetrainingReport> {
        let cycle_start = Utc::now();
        let names = self.registry.names();
        info!(models = names.len(), samples = new_data.len(), "learn cycle started");

        let mut performance_by_name = HashMap::new();
        let mut degraded = Vec::new();
        for name in &names {
            let Ok(record) = self.registry.get(name) else {
                continue;
            };
            let snapshot = self.evaluator.full_evaluate(record.model.as_ref(), new_data);
            self.perf.record(name, snapshot.clone());
            // The baseline is this model's own promotion-time snapshot.
            if self.perf.is_degraded(
                &snapshot,
                &record.performance,
                self.config.degradation_threshold,
            ) {
                warn!(
                    name = %name,
                    current_mse = snapshot.mse,
                    baseline_mse = record.performance.mse,
                    "degradation detected"
                );
                degraded.push(name.clone());
            }
            performance_by_name.insert(name.clone(), snapshot);
        }

        let mut retrained = Vec::new();
        let mut failed = HashMap::new();
        for name in degraded {
            // Another overlapping cycle may already have refreshed it.
            if let Ok(record) = self.registry.get(&name) {
                if record.promoted_at > cycle_start {
                    continue;
                }
            }
            if !self.try_start_job(&name, cycle_start) {
                info!(name = %name, "retraining already in flight, skipping");
                continue;
            }
            match self.retrain(&name, new_data) {
                Ok(()) => {
                    self.finish_job(&name, JobStatus::Completed);
                    retrained.push(name);
                }
                Err(e) => {
                    warn!(name = %name, error = %e, "retraining failed, keeping previous record");
                    self.finish_job(&name, JobStatus::Failed);
                    failed.insert(name, e.to_string());
                }
            }
        }

        // Ensemble weights are refreshed only once every retraining in
        // this cycle has finished.
        if !retrained.is_empty() {
            if let Some(ensemble) = &self.ensemble {
                ensemble.lock().refresh(&self.registry);
            }
        }

        info!(
            retrained = retrained.len(),
            failed = failed.len(),
            "learn cycle finished"
        );
        Ok(RetrainingReport {
            retrained,
            failed,
            performance_by_name,
            completed_at: Utc::now(),
        })
    }

    fn retrain(&self, name: &str, data: &Dataset) -> Result<()> {
        let (family, space, budget) = {
            let managed = self.managed.read();
            let scope = managed.get(name).ok_or_else(|| {
                AutoForecastError::Validation(format!(
                    "model '{name}' has no registered search scope"
                ))
            })?;
            (scope.family.clone(), scope.space.clone(), scope.budget.clone())
        };
        let factory = self.factories.get(&family)?;
        let outcome = self
            .orchestrator
            .run(name, data, &space, factory.as_ref(), &budget)?;

        let record = ModelRecord {
            name: name.to_string(),
            family,
            model: Arc::from(outcome.model),
            hyperparams: outcome.report.best_params,
            score: outcome.report.best_score,
            performance: outcome.report.performance,
            promoted_at: Utc::now(),
        };
        self.perf.record(name, record.performance.clone());
        self.registry.promote(record);
        Ok(())
    }

    /// Claim the retraining slot for a name. Refused while a job is
    /// running, or when a job triggered after `cycle_start` already
    /// handled the name (two overlapping cycles merge into one job).
    fn try_start_job(&self, name: &str, cycle_start: DateTime<Utc>) -> bool {
        let mut jobs = self.jobs.lock();
        match jobs.get(name) {
            Some(job) if job.status == JobStatus::Running => false,
            Some(job) if job.triggered_at >= cycle_start => false,
            _ => {
                jobs.insert(
                    name.to_string(),
                    RetrainingJob {
                        model_name: name.to_string(),
                        triggered_at: Utc::now(),
                        status: JobStatus::Running,
                    },
                );
                true
            }
        }
    }

    fn finish_job(&self, name: &str, status: JobStatus) {
        if let Some(job) = self.jobs.lock().get_mut(name) {
            job.status = status;
        }
    }

    /// Live status of every registered model.
    pub fn monitor(&self) -> HashMap<String, ModelStatus> {
        let mut statuses = HashMap::new();
        for name in self.registry.names() {
            let Ok(record) = self.registry.get(&name) else {
                continue;
            };
            let history = self.perf.history(&name);
            let current = history
                .last()
                .cloned()
                .unwrap_or_else(|| record.performance.clone());
            let degraded = self.perf.is_degraded(
                &current,
                &record.performance,
                self.config.degradation_threshold,
            );
            statuses.insert(
                name.clone(),
                ModelStatus {
                    current_performance: current,
                    trend: self.perf.trend(&name),
                    degraded,
                    last_promoted_at: record.promoted_at,
                },
            );
        }
        statuses
    }

    pub fn save_registry(&self, path: &Path) -> Result<()> {
        self.registry.save(path)
    }

    pub fn load_registry(&self, path: &Path) -> Result<usize> {
        self.registry.load(path, &self.factories)
    }

    /// Current ensemble weights, if an ensemble is configured.
    pub fn ensemble_weights(&self) -> Option<Vec<(String, f64)>> {
        self.ensemble.as_ref().map(|e| e.lock().weights())
    }

    /// Weighted-ensemble prediction over the registered members.
    pub fn predict_ensemble(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
        let ensemble = self.ensemble.as_ref().ok_or_else(|| {
            AutoForecastError::Validation("no ensemble configured".to_string())
        })?;
        let guard = ensemble.lock();
        guard.predict(&self.registry, features)
    }
}
