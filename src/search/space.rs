//! Parameter descriptors and sampled parameter sets

use crate::error::{AutoForecastError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of a single hyperparameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamKind {
    /// Finite set of named choices
    Categorical { choices: Vec<String> },
    /// Inclusive integer range
    IntRange { low: i64, high: i64 },
    /// Half-open float range
    FloatRange { low: f64, high: f64 },
}

impl ParamKind {
    pub(crate) fn draw<R: Rng>(&self, rng: &mut R) -> ParamValue {
        match self {
            ParamKind::Categorical { choices } => {
                ParamValue::Text(choices[rng.gen_range(0..choices.len())].clone())
            }
            ParamKind::IntRange { low, high } => ParamValue::Int(rng.gen_range(*low..=*high)),
            ParamKind::FloatRange { low, high } => ParamValue::Float(rng.gen_range(*low..*high)),
        }
    }
}

/// A named hyperparameter descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
}

/// A single sampled value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float view; integers coerce.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// One trial's sampled parameter set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialParams {
    values: BTreeMap<String, ParamValue>,
}

impl TrialParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(ParamValue::as_float)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(ParamValue::as_int)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(ParamValue::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }
}

/// Ordered, immutable set of parameter descriptors.
///
/// Only constructible through [`SearchSpace::builder`], which validates
/// every descriptor, so an in-hand space is always well-formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    params: Vec<Parameter>,
}

impl SearchSpace {
    pub fn builder() -> SearchSpaceBuilder {
        SearchSpaceBuilder { params: Vec::new() }
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Fluent builder; `build` validates all descriptors at once.
#[derive(Debug, Clone)]
pub struct SearchSpaceBuilder {
    params: Vec<Parameter>,
}

impl SearchSpaceBuilder {
    pub fn float(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.params.push(Parameter {
            name: name.into(),
            kind: ParamKind::FloatRange { low, high },
        });
        self
    }

    pub fn int(mut self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.params.push(Parameter {
            name: name.into(),
            kind: ParamKind::IntRange { low, high },
        });
        self
    }

    pub fn categorical(mut self, name: impl Into<String>, choices: &[&str]) -> Self {
        self.params.push(Parameter {
            name: name.into(),
            kind: ParamKind::Categorical {
                choices: choices.iter().map(|c| c.to_string()).collect(),
            },
        });
        self
    }

    pub fn build(self) -> Result<SearchSpace> {
        let mut seen = std::collections::HashSet::new();
        for param in &self.params {
            if !seen.insert(param.name.as_str()) {
                return Err(AutoForecastError::InvalidSearchSpace(format!(
                    "duplicate parameter '{}'",
                    param.name
                )));
            }
            match &param.kind {
                ParamKind::Categorical { choices } => {
                    if choices.is_empty() {
                        return Err(AutoForecastError::InvalidSearchSpace(format!(
                            "categorical '{}' has no choices",
                            param.name
                        )));
                    }
                }
                ParamKind::IntRange { low, high } => {
                    if low >= high {
                        return Err(AutoForecastError::InvalidSearchSpace(format!(
                            "int range '{}' requires low < high, got [{low}, {high}]",
                            param.name
                        )));
                    }
                }
                ParamKind::FloatRange { low, high } => {
                    if !(low.is_finite() && high.is_finite()) || low >= high {
                        return Err(AutoForecastError::InvalidSearchSpace(format!(
                            "float range '{}' requires finite low < high, got [{low}, {high}]",
                            param.name
                        )));
                    }
                }
            }
        }
        Ok(SearchSpace {
            params: self.params,
        })
    }
}
