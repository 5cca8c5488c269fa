//! Integration tests: continuous learning lifecycle

use autoforecast::prelude::*;
use chrono::Utc;
use ndarray::{Array1, Array2};
use std::fs;
use std::sync::Arc;

/// Linear regime: y = slope * x + offset over scaled inputs.
fn regime(n: usize, slope: f64, offset: f64) -> Dataset {
    let feats: Vec<f64> = (0..n).map(|i| (i as f64 / n as f64) * 2.0 - 1.0).collect();
    let targets: Vec<f64> = feats.iter().map(|x| slope * x + offset).collect();
    Dataset::new(
        Array2::from_shape_vec((n, 1), feats).unwrap(),
        Array1::from_vec(targets),
    )
    .unwrap()
}

fn ridge_space() -> SearchSpace {
    SearchSpace::builder()
        .float("alpha", 1e-6, 1e-2)
        .float("learning_rate", 0.01, 0.3)
        .int("epochs", 200, 500)
        .build()
        .unwrap()
}

fn learner() -> ContinuousLearner {
    let mut factories = ModelFactorySet::new();
    factories.register(Arc::new(RidgeFactory));
    ContinuousLearner::new(factories, LearnerConfig::new().with_folds(3).with_workers(2))
}

/// Re-promote a model with an artificially strong baseline so the next
/// learn cycle sees it as degraded.
fn pin_tiny_baseline(learner: &ContinuousLearner, name: &str) {
    let record = learner.registry().get(name).unwrap();
    let mut baseline = record.performance.clone();
    baseline.mse = 1e-9;
    learner.registry().promote(ModelRecord {
        name: record.name.clone(),
        family: record.family.clone(),
        model: record.model.clone(),
        hyperparams: record.hyperparams.clone(),
        score: record.score,
        performance: baseline,
        promoted_at: record.promoted_at,
    });
}

#[test]
fn test_regime_shift_triggers_retraining() {
    let learner = learner();
    learner
        .optimize("m1", RIDGE_FAMILY, &regime(80, 1.5, 0.1), ridge_space(), TrialBudget::new(6))
        .unwrap();
    let before = learner.registry().get("m1").unwrap().promoted_at;

    // Different slope and level: the old model is far off its baseline.
    let report = learner.learn(&regime(80, -2.0, 5.0)).unwrap();

    assert_eq!(report.retrained, vec!["m1".to_string()]);
    assert!(report.failed.is_empty());
    let after = learner.registry().get("m1").unwrap();
    assert!(after.promoted_at > before, "record must be replaced");

    let jobs = learner.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, JobStatus::Completed);
}

#[test]
fn test_stable_data_means_no_jobs() {
    let learner = learner();
    let data = regime(80, 1.5, 0.1);
    learner
        .optimize("m1", RIDGE_FAMILY, &data, ridge_space(), TrialBudget::new(6))
        .unwrap();

    let report = learner.learn(&data).unwrap();
    assert!(report.retrained.is_empty());
    assert!(learner.jobs().is_empty());

    let statuses = learner.monitor();
    assert!(!statuses["m1"].degraded);
}

#[test]
fn test_failed_retraining_keeps_previous_record() {
    let learner = learner();
    learner
        .optimize("m1", RIDGE_FAMILY, &regime(80, 1.5, 0.1), ridge_space(), TrialBudget::new(6))
        .unwrap();
    let before = learner.registry().get("m1").unwrap();

    // Exploding feature scale: every retraining trial diverges, while
    // the stale model still produces a finite (terrible) snapshot.
    let n = 80;
    let feats: Vec<f64> = (0..n).map(|i| 1e8 * (i as f64 + 1.0)).collect();
    let targets: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let hostile = Dataset::new(
        Array2::from_shape_vec((n, 1), feats).unwrap(),
        Array1::from_vec(targets),
    )
    .unwrap();

    let report = learner.learn(&hostile).unwrap();

    assert!(report.retrained.is_empty());
    assert!(report.failed.contains_key("m1"));
    let after = learner.registry().get("m1").unwrap();
    assert_eq!(after.promoted_at, before.promoted_at, "old record must survive");

    let jobs = learner.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, JobStatus::Failed);
}

#[test]
fn test_concurrent_learn_retrains_once() {
    let learner = learner();
    learner
        .optimize("m1", RIDGE_FAMILY, &regime(80, 1.5, 0.1), ridge_space(), TrialBudget::new(6))
        .unwrap();
    pin_tiny_baseline(&learner, "m1");

    let fresh = regime(80, 1.5, 0.1);
    let reports: Vec<RetrainingReport> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| scope.spawn(|| learner.learn(&fresh).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let total_retrained: usize = reports.iter().map(|r| r.retrained.len()).sum();
    assert_eq!(
        total_retrained, 1,
        "exactly one retraining may complete for a name per batch"
    );
    let completed = learner
        .jobs()
        .into_iter()
        .filter(|j| j.model_name == "m1" && j.status == JobStatus::Completed)
        .count();
    assert_eq!(completed, 1);
}

#[test]
fn test_registry_round_trip_through_learner() {
    let dir = std::env::temp_dir().join("autoforecast_lifecycle_roundtrip");
    let _ = fs::create_dir_all(&dir);
    let path = dir.join("registry.json");

    let first = learner();
    first
        .optimize("m1", RIDGE_FAMILY, &regime(80, 1.5, 0.1), ridge_space(), TrialBudget::new(6))
        .unwrap();
    first
        .optimize("m2", RIDGE_FAMILY, &regime(80, -0.5, 2.0), ridge_space(), TrialBudget::new(6))
        .unwrap();
    first.save_registry(&path).unwrap();

    let second = learner();
    assert_eq!(second.load_registry(&path).unwrap(), 2);
    assert_eq!(second.registry().names(), first.registry().names());
    for name in ["m1", "m2"] {
        let a = first.registry().get(name).unwrap();
        let b = second.registry().get(name).unwrap();
        assert_eq!(a.score, b.score);
        assert_eq!(a.hyperparams, b.hyperparams);
        assert_eq!(a.performance, b.performance);
        assert_eq!(a.promoted_at, b.promoted_at);
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_load_missing_registry_is_distinct_from_empty() {
    let learner = learner();
    let err = learner
        .load_registry(std::path::Path::new("/nonexistent/registry.json"))
        .unwrap_err();
    assert!(matches!(err, AutoForecastError::RegistryLoad(_)));
    // The registry itself is merely empty, which is not an error state.
    assert!(learner.registry().is_empty());
}

#[test]
fn test_ensemble_refreshes_after_retraining() {
    let mut factories = ModelFactorySet::new();
    factories.register(Arc::new(RidgeFactory));
    let learner = ContinuousLearner::new(
        factories,
        LearnerConfig::new().with_folds(3).with_workers(2),
    )
    .with_ensemble(vec!["m1".to_string(), "m2".to_string()]);

    let data = regime(80, 1.5, 0.1);
    learner
        .optimize("m1", RIDGE_FAMILY, &data, ridge_space(), TrialBudget::new(6))
        .unwrap();
    learner
        .optimize("m2", RIDGE_FAMILY, &data, ridge_space(), TrialBudget::new(6))
        .unwrap();
    pin_tiny_baseline(&learner, "m1");

    let report = learner.learn(&data).unwrap();
    assert_eq!(report.retrained, vec!["m1".to_string()]);

    let weights = learner.ensemble_weights().unwrap();
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(weights.iter().all(|(_, w)| *w > 0.0));

    // The refreshed ensemble predicts through the registry.
    let preds = learner.predict_ensemble(data.features()).unwrap();
    assert_eq!(preds.len(), data.len());

    let monitoring = learner.monitor();
    assert!(monitoring["m1"].last_promoted_at > monitoring["m2"].last_promoted_at);
}

#[test]
fn test_degradation_scenario_thresholds() {
    let monitor = PerformanceMonitor::new(3);
    let baseline = PerformanceSnapshot {
        mse: 10.0,
        mae: 2.5,
        rmse: 10.0_f64.sqrt(),
        r2: 0.9,
        measured_at: Utc::now(),
    };
    let mut current = baseline.clone();

    current.mse = 11.5; // 15% over: degraded
    assert!(monitor.is_degraded(&current, &baseline, 0.10));
    current.mse = 10.5; // 5% over: fine
    assert!(!monitor.is_degraded(&current, &baseline, 0.10));
}
