//! Trial scoring and full-dataset evaluation

use super::folds::walk_forward;
use crate::dataset::Dataset;
use crate::error::{AutoForecastError, Result};
use crate::model::{ModelFactory, TrainableModel};
use crate::monitor::PerformanceSnapshot;
use crate::search::TrialParams;
use ndarray::Array1;
use tracing::warn;

/// Immutable per-trial evaluation context. Workers only ever borrow
/// this; nothing mutable is shared between concurrent trials.
#[derive(Debug, Clone, Copy)]
pub struct TrialContext<'a> {
    pub dataset: &'a Dataset,
    pub params: &'a TrialParams,
}

/// Scores candidates under walk-forward cross-validation.
#[derive(Debug, Clone)]
pub struct ObjectiveEvaluator {
    folds: usize,
}

impl ObjectiveEvaluator {
    pub fn new(folds: usize) -> Self {
        Self {
            folds: folds.max(1),
        }
    }

    pub fn folds(&self) -> usize {
        self.folds
    }

    /// Mean squared-error loss across walk-forward folds, lower is
    /// better. Any fold failure or non-finite loss is an error; the
    /// caller records the trial as failed instead of aborting the run.
    pub fn evaluate(&self, factory: &dyn ModelFactory, ctx: &TrialContext<'_>) -> Result<f64> {
        let splits = walk_forward(ctx.dataset.len(), self.folds)?;
        let mut total = 0.0;
        for split in &splits {
            let (x_train, y_train) = ctx.dataset.select(&split.train_indices);
            let (x_test, y_test) = ctx.dataset.select(&split.test_indices);

            let mut model = factory.build(ctx.params)?;
            model.fit(&x_train, &y_train)?;
            let preds = model.predict(&x_test)?;

            let loss = mean_squared_error(&y_test, &preds);
            if !loss.is_finite() {
                return Err(AutoForecastError::Evaluation(format!(
                    "non-finite loss on fold {}",
                    split.fold
                )));
            }
            total += loss;
        }
        Ok(total / splits.len() as f64)
    }

    /// Full-dataset evaluation for promotion baselines and monitoring.
    /// Never fails: any error collapses into the sentinel snapshot.
    pub fn full_evaluate(&self, model: &dyn TrainableModel, dataset: &Dataset) -> PerformanceSnapshot {
        match model.predict(dataset.features()) {
            Ok(preds) => {
                let snapshot = PerformanceSnapshot::from_predictions(dataset.targets(), &preds);
                if snapshot.mse.is_finite() {
                    snapshot
                } else {
                    PerformanceSnapshot::sentinel()
                }
            }
            Err(e) => {
                warn!(family = model.family(), error = %e, "evaluation failed, recording sentinel");
                PerformanceSnapshot::sentinel()
            }
        }
    }
}

fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p) * (t - p))
        .sum::<f64>()
        / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RidgeFactory;
    use crate::search::ParamValue;
    use ndarray::{Array1, Array2};

    fn linear_dataset(n: usize) -> Dataset {
        let feats: Vec<f64> = (0..n).map(|i| i as f64 / n as f64).collect();
        let targets: Vec<f64> = feats.iter().map(|x| 3.0 * x + 0.5).collect();
        Dataset::new(
            Array2::from_shape_vec((n, 1), feats).unwrap(),
            Array1::from_vec(targets),
        )
        .unwrap()
    }

    fn stable_params() -> TrialParams {
        let mut params = TrialParams::new();
        params.insert("alpha", ParamValue::Float(1e-4));
        params.insert("learning_rate", ParamValue::Float(0.1));
        params.insert("epochs", ParamValue::Int(500));
        params
    }

    #[test]
    fn test_evaluate_mean_fold_loss() {
        let data = linear_dataset(60);
        let params = stable_params();
        let evaluator = ObjectiveEvaluator::new(3);
        let ctx = TrialContext {
            dataset: &data,
            params: &params,
        };
        let score = evaluator.evaluate(&RidgeFactory, &ctx).unwrap();
        assert!(score.is_finite());
        assert!(score < 1.0, "easy linear data should score well, got {score}");
    }

    #[test]
    fn test_evaluate_divergence_is_error() {
        let data = linear_dataset(60);
        let mut params = TrialParams::new();
        params.insert("learning_rate", ParamValue::Float(50.0));
        params.insert("epochs", ParamValue::Int(200));
        let evaluator = ObjectiveEvaluator::new(3);
        let ctx = TrialContext {
            dataset: &data,
            params: &params,
        };
        assert!(evaluator.evaluate(&RidgeFactory, &ctx).is_err());
    }

    #[test]
    fn test_full_evaluate_unfit_model_is_sentinel() {
        let data = linear_dataset(30);
        let evaluator = ObjectiveEvaluator::new(3);
        let model = crate::model::RidgeForecaster::new(1e-3, 0.01, 10);
        let snapshot = evaluator.full_evaluate(&model, &data);
        assert!(snapshot.is_sentinel());
    }

    #[test]
    fn test_full_evaluate_fit_model() {
        let data = linear_dataset(30);
        let evaluator = ObjectiveEvaluator::new(3);
        let mut model = crate::model::RidgeForecaster::new(1e-4, 0.1, 2000);
        model.fit(data.features(), data.targets()).unwrap();
        let snapshot = evaluator.full_evaluate(&model, &data);
        assert!(!snapshot.is_sentinel());
        assert!(snapshot.r2 > 0.9);
    }
}
