//! Reference model family: L2-regularised linear forecaster
//!
//! Small and fast enough to run inside trial loops; heavier families
//! plug in behind the same trait.

use super::{ModelFactory, TrainableModel};
use crate::error::{AutoForecastError, Result};
use crate::search::TrialParams;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

pub const RIDGE_FAMILY: &str = "ridge";

/// Linear forecaster fit by batch gradient descent with L2 shrinkage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeForecaster {
    alpha: f64,
    learning_rate: f64,
    epochs: usize,
    weights: Option<Array1<f64>>,
    intercept: f64,
}

impl RidgeForecaster {
    pub fn new(alpha: f64, learning_rate: f64, epochs: usize) -> Self {
        Self {
            alpha,
            learning_rate,
            epochs: epochs.max(1),
            weights: None,
            intercept: 0.0,
        }
    }

    pub fn is_fit(&self) -> bool {
        self.weights.is_some()
    }
}

impl TrainableModel for RidgeForecaster {
    fn family(&self) -> &'static str {
        RIDGE_FAMILY
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(AutoForecastError::Training(
                "feature rows and targets must match and be non-empty".to_string(),
            ));
        }
        let n = x.nrows() as f64;
        let mut weights = Array1::<f64>::zeros(x.ncols());
        let mut intercept = 0.0;

        for _ in 0..self.epochs {
            let residuals = x.dot(&weights) + intercept - y;
            let grad_w = x.t().dot(&residuals) / n + &weights * self.alpha;
            let grad_b = residuals.sum() / n;

            weights = weights - grad_w * self.learning_rate;
            intercept -= grad_b * self.learning_rate;

            if !intercept.is_finite() || weights.iter().any(|w| !w.is_finite()) {
                return Err(AutoForecastError::Training(
                    "gradient descent diverged".to_string(),
                ));
            }
        }

        self.weights = Some(weights);
        self.intercept = intercept;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let weights = self.weights.as_ref().ok_or_else(|| {
            AutoForecastError::Training("model has not been fit".to_string())
        })?;
        if x.ncols() != weights.len() {
            return Err(AutoForecastError::Validation(format!(
                "expected {} feature columns, got {}",
                weights.len(),
                x.ncols()
            )));
        }
        Ok(x.dot(weights) + self.intercept)
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Builds ridge forecasters from sampled hyperparameters:
/// `alpha` (float), `learning_rate` (float), `epochs` (int).
#[derive(Debug, Default, Clone, Copy)]
pub struct RidgeFactory;

impl ModelFactory for RidgeFactory {
    fn family(&self) -> &'static str {
        RIDGE_FAMILY
    }

    fn build(&self, params: &TrialParams) -> Result<Box<dyn TrainableModel>> {
        let alpha = params.get_float("alpha").unwrap_or(1e-3);
        let learning_rate = params.get_float("learning_rate").unwrap_or(1e-2);
        let epochs = params.get_int("epochs").unwrap_or(200).max(1) as usize;
        Ok(Box::new(RidgeForecaster::new(alpha, learning_rate, epochs)))
    }

    fn restore(&self, bytes: &[u8]) -> Result<Box<dyn TrainableModel>> {
        let model: RidgeForecaster = serde_json::from_slice(bytes)?;
        Ok(Box::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn linear_data() -> (Array2<f64>, Array1<f64>) {
        // y = 2x + 1
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 3.0, 5.0, 7.0, 9.0, 11.0];
        (x, y)
    }

    #[test]
    fn test_fit_recovers_linear_relation() {
        let (x, y) = linear_data();
        let mut model = RidgeForecaster::new(0.0, 0.05, 2000);
        model.fit(&x, &y).unwrap();

        let preds = model.predict(&x).unwrap();
        for (p, t) in preds.iter().zip(y.iter()) {
            assert!((p - t).abs() < 0.1, "prediction {p} too far from {t}");
        }
    }

    #[test]
    fn test_divergence_is_a_training_error() {
        let (x, y) = linear_data();
        let mut model = RidgeForecaster::new(0.0, 10.0, 500);
        let err = model.fit(&x, &y).unwrap_err();
        assert!(matches!(err, AutoForecastError::Training(_)));
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = RidgeForecaster::new(1e-3, 0.01, 10);
        assert!(model.predict(&array![[1.0]]).is_err());
    }

    #[test]
    fn test_artifact_round_trip() {
        let (x, y) = linear_data();
        let mut model = RidgeForecaster::new(1e-4, 0.05, 1000);
        model.fit(&x, &y).unwrap();

        let bytes = model.to_bytes().unwrap();
        let restored = RidgeFactory.restore(&bytes).unwrap();

        let original = model.predict(&x).unwrap();
        let roundtrip = restored.predict(&x).unwrap();
        for (a, b) in original.iter().zip(roundtrip.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_factory_reads_params() {
        let mut params = TrialParams::new();
        params.insert("alpha", crate::search::ParamValue::Float(0.5));
        params.insert("epochs", crate::search::ParamValue::Int(3));
        let model = RidgeFactory.build(&params).unwrap();
        assert_eq!(model.family(), RIDGE_FAMILY);
    }
}
