//! Model registry: one live record per name, whole-record promotion

use crate::error::{AutoForecastError, Result};
use crate::model::{ModelFactorySet, TrainableModel};
use crate::monitor::PerformanceSnapshot;
use crate::search::TrialParams;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Live registry entry. Replaced whole on promotion, never patched, so
/// concurrent readers see either the old or the new record.
pub struct ModelRecord {
    pub name: String,
    pub family: String,
    pub model: Arc<dyn TrainableModel>,
    pub hyperparams: TrialParams,
    pub score: f64,
    /// Promotion-time snapshot; the degradation baseline for this model
    pub performance: PerformanceSnapshot,
    pub promoted_at: DateTime<Utc>,
}

/// On-disk form of a record. The artifact blob format is owned by the
/// model family that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedRecord {
    family: String,
    hyperparams: TrialParams,
    score: f64,
    performance: PerformanceSnapshot,
    promoted_at: DateTime<Utc>,
    artifact: Vec<u8>,
}

/// Shared name → record map. All mutation goes through [`promote`],
/// [`remove`] or [`load`]; there is no partial update.
///
/// [`promote`]: ModelRegistry::promote
/// [`remove`]: ModelRegistry::remove
/// [`load`]: ModelRegistry::load
#[derive(Default)]
pub struct ModelRegistry {
    records: RwLock<HashMap<String, Arc<ModelRecord>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace any existing record for this name.
    pub fn promote(&self, record: ModelRecord) {
        info!(name = %record.name, score = record.score, "promoting model");
        self.records
            .write()
            .insert(record.name.clone(), Arc::new(record));
    }

    pub fn get(&self, name: &str) -> Result<Arc<ModelRecord>> {
        self.records
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| AutoForecastError::ModelNotFound(name.to_string()))
    }

    /// Registered names, sorted for stable iteration.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.records.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Drop a model from the registry. Returns whether it existed.
    pub fn remove(&self, name: &str) -> bool {
        self.records.write().remove(name).is_some()
    }

    /// Serialize the whole mapping to `path`. The store is written to a
    /// temp file first and renamed into place, so a crash mid-save never
    /// leaves a torn store behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot: Vec<Arc<ModelRecord>> = self.records.read().values().cloned().collect();

        let mut persisted = BTreeMap::new();
        for record in snapshot {
            let artifact = record.model.to_bytes().map_err(|e| {
                AutoForecastError::RegistrySave(format!("serializing '{}': {e}", record.name))
            })?;
            persisted.insert(
                record.name.clone(),
                PersistedRecord {
                    family: record.family.clone(),
                    hyperparams: record.hyperparams.clone(),
                    score: record.score,
                    performance: record.performance.clone(),
                    promoted_at: record.promoted_at,
                    artifact,
                },
            );
        }

        let json = serde_json::to_vec_pretty(&persisted)
            .map_err(|e| AutoForecastError::RegistrySave(e.to_string()))?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &json)
            .map_err(|e| AutoForecastError::RegistrySave(format!("{}: {e}", tmp.display())))?;
        fs::rename(&tmp, path)
            .map_err(|e| AutoForecastError::RegistrySave(format!("{}: {e}", path.display())))?;

        debug!(path = %path.display(), records = persisted.len(), "registry saved");
        Ok(())
    }

    /// Replace the registry contents from a saved store. A missing or
    /// unreadable store is an error, distinct from loading an empty one.
    /// Returns the number of records restored.
    pub fn load(&self, path: &Path, factories: &ModelFactorySet) -> Result<usize> {
        let bytes = fs::read(path)
            .map_err(|e| AutoForecastError::RegistryLoad(format!("{}: {e}", path.display())))?;
        let persisted: BTreeMap<String, PersistedRecord> = serde_json::from_slice(&bytes)
            .map_err(|e| AutoForecastError::RegistryLoad(format!("{}: {e}", path.display())))?;

        let mut restored = HashMap::with_capacity(persisted.len());
        for (name, rec) in persisted {
            let factory = factories.get(&rec.family).map_err(|_| {
                AutoForecastError::RegistryLoad(format!(
                    "no factory for family '{}' (model '{name}')",
                    rec.family
                ))
            })?;
            let model = factory.restore(&rec.artifact).map_err(|e| {
                AutoForecastError::RegistryLoad(format!("restoring '{name}': {e}"))
            })?;
            let record = ModelRecord {
                name: name.clone(),
                family: rec.family,
                model: Arc::from(model),
                hyperparams: rec.hyperparams,
                score: rec.score,
                performance: rec.performance,
                promoted_at: rec.promoted_at,
            };
            restored.insert(name, Arc::new(record));
        }

        let count = restored.len();
        *self.records.write() = restored;
        info!(path = %path.display(), records = count, "registry loaded");
        Ok(count)
    }
}
