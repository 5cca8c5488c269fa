//! Weighted aggregation across registered models

use crate::error::{AutoForecastError, Result};
use crate::registry::ModelRegistry;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Combines named registry models with inverse-error weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedEnsemble {
    members: Vec<String>,
    weights: Vec<f64>,
}

impl WeightedEnsemble {
    /// Start with uniform weights over the given member names.
    pub fn new(members: Vec<String>) -> Self {
        let n = members.len();
        let weights = if n == 0 {
            Vec::new()
        } else {
            vec![1.0 / n as f64; n]
        };
        Self { members, weights }
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn weights(&self) -> Vec<(String, f64)> {
        self.members
            .iter()
            .cloned()
            .zip(self.weights.iter().copied())
            .collect()
    }

    /// Re-derive weights from each member's live record: normalised
    /// inverse mse of its promotion snapshot. Members missing from the
    /// registry, or with a sentinel snapshot, get zero weight.
    pub fn refresh(&mut self, registry: &ModelRegistry) {
        let raw: Vec<f64> = self
            .members
            .iter()
            .map(|name| match registry.get(name) {
                Ok(record) if record.performance.mse.is_finite() => {
                    1.0 / (record.performance.mse + 1e-12)
                }
                _ => 0.0,
            })
            .collect();
        let total: f64 = raw.iter().sum();
        self.weights = if total > 0.0 {
            raw.iter().map(|w| w / total).collect()
        } else {
            raw
        };
        debug!(members = self.members.len(), "ensemble weights refreshed");
    }

    /// Weighted average of member predictions.
    pub fn predict(&self, registry: &ModelRegistry, features: &Array2<f64>) -> Result<Array1<f64>> {
        if self.members.is_empty() {
            return Err(AutoForecastError::Validation(
                "ensemble has no members".to_string(),
            ));
        }

        let mut acc = Array1::<f64>::zeros(features.nrows());
        let mut used = 0.0;
        for (name, &weight) in self.members.iter().zip(self.weights.iter()) {
            if weight <= 0.0 {
                continue;
            }
            let record = registry.get(name)?;
            let preds = record.model.predict(features)?;
            acc = acc + preds * weight;
            used += weight;
        }
        if used <= 0.0 {
            return Err(AutoForecastError::Validation(
                "ensemble has no usable members".to_string(),
            ));
        }
        Ok(acc / used)
    }
}
