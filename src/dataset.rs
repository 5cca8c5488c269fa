//! Time-ordered dataset carrier

use crate::error::{AutoForecastError, Result};
use ndarray::{Array1, Array2, Axis};

/// Feature matrix and target vector for one series.
///
/// Row order is time order; all fold logic relies on it.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Array2<f64>,
    targets: Array1<f64>,
}

impl Dataset {
    /// Create a dataset, validating that features and targets line up.
    pub fn new(features: Array2<f64>, targets: Array1<f64>) -> Result<Self> {
        if features.nrows() == 0 {
            return Err(AutoForecastError::Validation(
                "dataset must contain at least one row".to_string(),
            ));
        }
        if features.nrows() != targets.len() {
            return Err(AutoForecastError::Validation(format!(
                "feature rows ({}) do not match targets ({})",
                features.nrows(),
                targets.len()
            )));
        }
        Ok(Self { features, targets })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Number of feature columns
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn targets(&self) -> &Array1<f64> {
        &self.targets
    }

    /// Row subset of both features and targets, in the given order.
    pub fn select(&self, indices: &[usize]) -> (Array2<f64>, Array1<f64>) {
        (
            self.features.select(Axis(0), indices),
            self.targets.select(Axis(0), indices),
        )
    }
}
