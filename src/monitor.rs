//! Performance snapshots, history and degradation detection

use chrono::{DateTime, Utc};
use ndarray::Array1;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Point-in-time evaluation of one model. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub mse: f64,
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    pub measured_at: DateTime<Utc>,
}

impl PerformanceSnapshot {
    /// Regression metrics from true and predicted targets.
    pub fn from_predictions(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        if y_true.is_empty() || y_true.len() != y_pred.len() {
            return Self::sentinel();
        }
        let n = y_true.len() as f64;
        let mut sq = 0.0;
        let mut abs = 0.0;
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            let err = t - p;
            sq += err * err;
            abs += err.abs();
        }
        let mse = sq / n;
        let mae = abs / n;

        let y_mean = y_true.iter().sum::<f64>() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let r2 = if ss_tot > 0.0 { 1.0 - sq / ss_tot } else { 0.0 };

        Self {
            mse,
            mae,
            rmse: mse.sqrt(),
            r2,
            measured_at: Utc::now(),
        }
    }

    /// Sentinel recorded when evaluation itself fails.
    pub fn sentinel() -> Self {
        Self {
            mse: f64::INFINITY,
            mae: f64::INFINITY,
            rmse: f64::INFINITY,
            r2: 0.0,
            measured_at: Utc::now(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !self.mse.is_finite()
    }
}

/// Direction of recent performance movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Improving,
    Stable,
    Degrading,
}

/// Trend summary over the recent history window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub trend: Trend,
    /// Relative mse change between the previous window and the latest
    /// one; negative means improving
    pub improvement_rate: f64,
    /// Standard deviation of mse over the combined window
    pub volatility: f64,
}

impl TrendReport {
    fn stable() -> Self {
        Self {
            trend: Trend::Stable,
            improvement_rate: 0.0,
            volatility: 0.0,
        }
    }
}

/// Append-only performance history per model name.
pub struct PerformanceMonitor {
    histories: RwLock<HashMap<String, Vec<PerformanceSnapshot>>>,
    window: usize,
}

impl PerformanceMonitor {
    /// `window` is the number of recent snapshots compared for trends.
    pub fn new(window: usize) -> Self {
        Self {
            histories: RwLock::new(HashMap::new()),
            window: window.max(1),
        }
    }

    /// Append a snapshot to the model's history.
    pub fn record(&self, name: &str, snapshot: PerformanceSnapshot) {
        self.histories
            .write()
            .entry(name.to_string())
            .or_default()
            .push(snapshot);
    }

    /// Full recorded history for a model, oldest first.
    pub fn history(&self, name: &str) -> Vec<PerformanceSnapshot> {
        self.histories
            .read()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Trend from comparing the mean mse of the last `window` snapshots
    /// to the `window` before them. Sentinel snapshots are excluded.
    pub fn trend(&self, name: &str) -> TrendReport {
        let histories = self.histories.read();
        let Some(history) = histories.get(name) else {
            return TrendReport::stable();
        };
        let finite: Vec<f64> = history
            .iter()
            .map(|s| s.mse)
            .filter(|m| m.is_finite())
            .collect();
        if finite.len() < 2 {
            return TrendReport::stable();
        }

        let k = self.window.min(finite.len() / 2);
        let recent = &finite[finite.len() - k..];
        let prior = &finite[finite.len() - 2 * k..finite.len() - k];
        let mean_recent = mean(recent);
        let mean_prior = mean(prior);

        let improvement_rate = if mean_prior > 0.0 {
            (mean_recent - mean_prior) / mean_prior
        } else {
            0.0
        };
        let tail = &finite[finite.len() - 2 * k..];
        let volatility = std_dev(tail);

        let trend = if improvement_rate < -0.05 {
            Trend::Improving
        } else if improvement_rate > 0.05 {
            Trend::Degrading
        } else {
            Trend::Stable
        };
        TrendReport {
            trend,
            improvement_rate,
            volatility,
        }
    }

    /// True iff `current` worsens on `baseline` by more than `threshold`
    /// (relative mse). Exactly at the boundary is not degraded. The
    /// baseline must be the model's own promotion-time snapshot.
    pub fn is_degraded(
        &self,
        current: &PerformanceSnapshot,
        baseline: &PerformanceSnapshot,
        threshold: f64,
    ) -> bool {
        current.mse > baseline.mse * (1.0 + threshold)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}
