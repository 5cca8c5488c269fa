//! Trainable-model contract and factories
//!
//! Model families live behind [`TrainableModel`]; the controller never
//! sees architecture details. A [`ModelFactory`] builds family
//! instances from sampled hyperparameters and restores them from
//! persisted artifacts, whose byte format the family owns.

mod ridge;

pub use ridge::{RidgeFactory, RidgeForecaster, RIDGE_FAMILY};

use crate::error::{AutoForecastError, Result};
use crate::search::TrialParams;
use ndarray::{Array1, Array2};
use std::collections::HashMap;
use std::sync::Arc;

/// Opaque trainable capability: fit on history, predict forward.
pub trait TrainableModel: Send + Sync {
    /// Stable family tag, used to route artifacts back to a factory.
    fn family(&self) -> &'static str;

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Serialized model state; the format is owned by the family.
    fn to_bytes(&self) -> Result<Vec<u8>>;
}

/// Builds and restores instances of one model family.
pub trait ModelFactory: Send + Sync {
    fn family(&self) -> &'static str;

    /// Fresh, unfit instance configured from sampled hyperparameters.
    fn build(&self, params: &TrialParams) -> Result<Box<dyn TrainableModel>>;

    /// Rehydrate an instance from a persisted artifact.
    fn restore(&self, bytes: &[u8]) -> Result<Box<dyn TrainableModel>>;
}

/// Factories keyed by family tag.
#[derive(Default, Clone)]
pub struct ModelFactorySet {
    factories: HashMap<String, Arc<dyn ModelFactory>>,
}

impl ModelFactorySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Arc<dyn ModelFactory>) {
        self.factories
            .insert(factory.family().to_string(), factory);
    }

    pub fn get(&self, family: &str) -> Result<Arc<dyn ModelFactory>> {
        self.factories.get(family).cloned().ok_or_else(|| {
            AutoForecastError::Validation(format!("no factory registered for family '{family}'"))
        })
    }

    pub fn contains(&self, family: &str) -> bool {
        self.factories.contains_key(family)
    }

    pub fn families(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}
