//! `linear` kind: vector outputs that are affine in the scalar inputs.
//!
//! Each output `o` has a weight matrix `W_o` (one row per output component,
//! one column per input) and an optional bias `b_o`:
//! `y_o = scale * (W_o · x) + b_o`.
//!
//! Weights live in the payload. Input bounds belong to the module source, so
//! a restored model always validates inputs with the bounds of the code it
//! was loaded with.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::contract::{require_input, select_outputs, CantCompute, Inputs, Outputs, PicoModel};
use crate::models::module::{ModelKind, ModelModule, ModuleError, ModuleSource};

pub const KIND: &str = "linear";
pub const TYPE_TAG: &str = "linear.LinearModel";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearOutput {
    pub weights: Vec<Vec<f64>>,
    #[serde(default)]
    pub bias: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct LinearParams {
    inputs: Vec<String>,
    outputs: BTreeMap<String, LinearOutput>,
    #[serde(default)]
    bounds: BTreeMap<String, [f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    inputs: Vec<String>,
    outputs: BTreeMap<String, LinearOutput>,
    scale: f64,
    #[serde(skip)]
    bounds: BTreeMap<String, [f64; 2]>,
}

impl LinearModel {
    fn validate(&self) -> Result<(), String> {
        if self.outputs.is_empty() {
            return Err("at least one output is required".into());
        }
        if !self.scale.is_finite() {
            return Err(format!("scale must be finite, got {}", self.scale));
        }
        for (name, out) in &self.outputs {
            if out.weights.is_empty() {
                return Err(format!("output '{}' has no weight rows", name));
            }
            if let Some(row) = out.weights.iter().find(|r| r.len() != self.inputs.len()) {
                return Err(format!(
                    "output '{}' has a weight row of length {}, expected {}",
                    name,
                    row.len(),
                    self.inputs.len()
                ));
            }
            if out.weights.iter().flatten().chain(&out.bias).any(|v| !v.is_finite()) {
                return Err(format!("output '{}' has non-finite weights or bias", name));
            }
            if !out.bias.is_empty() && out.bias.len() != out.weights.len() {
                return Err(format!(
                    "output '{}' bias has length {}, expected {}",
                    name,
                    out.bias.len(),
                    out.weights.len()
                ));
            }
        }
        for (name, [min, max]) in &self.bounds {
            if !self.inputs.contains(name) {
                return Err(format!("bounds given for unknown input '{}'", name));
            }
            if !min.is_finite() || !max.is_finite() {
                return Err(format!("bounds for '{}' must be finite: [{}, {}]", name, min, max));
            }
            if min > max {
                return Err(format!("bounds for '{}' are inverted: [{}, {}]", name, min, max));
            }
        }
        Ok(())
    }
}

impl PicoModel for LinearModel {
    fn inputs(&self) -> Vec<String> {
        self.inputs.clone()
    }

    fn outputs(&self) -> Vec<String> {
        self.outputs.keys().cloned().collect()
    }

    fn evaluate(&self, outputs: Option<&[String]>, inputs: &Inputs) -> Result<Outputs, CantCompute> {
        let selected = select_outputs(&self.outputs(), outputs)?;

        let mut x = Vec::with_capacity(self.inputs.len());
        for name in &self.inputs {
            let value = require_input(inputs, name)?;
            if let Some([min, max]) = self.bounds.get(name) {
                if value < *min || value > *max {
                    return Err(CantCompute::OutOfBounds {
                        name: name.clone(),
                        value,
                        min: *min,
                        max: *max,
                    });
                }
            }
            x.push(value);
        }

        let mut result = Outputs::new();
        for name in selected {
            let out = &self.outputs[&name];
            let values = out
                .weights
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    let dot: f64 = row.iter().zip(&x).map(|(w, v)| w * v).sum();
                    self.scale * dot + out.bias.get(i).copied().unwrap_or(0.0)
                })
                .collect();
            result.insert(name, values);
        }
        Ok(result)
    }

    fn type_tag(&self) -> &str {
        TYPE_TAG
    }

    fn state(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

struct LinearModule {
    params: LinearParams,
}

impl ModelModule for LinearModule {
    fn construct(&self, args: &[serde_json::Value]) -> Result<Box<dyn PicoModel>, ModuleError> {
        let scale = match args {
            [] => 1.0,
            [value] => value
                .as_f64()
                .ok_or_else(|| ModuleError::InvalidArgs(format!("scale must be a number, got {}", value)))?,
            _ => {
                return Err(ModuleError::InvalidArgs(format!(
                    "expected at most 1 argument (scale), got {}",
                    args.len()
                )))
            }
        };
        let model = LinearModel {
            inputs: self.params.inputs.clone(),
            outputs: self.params.outputs.clone(),
            scale,
            bounds: self.params.bounds.clone(),
        };
        model.validate().map_err(ModuleError::InvalidArgs)?;
        Ok(Box::new(model))
    }

    fn restore(&self, type_tag: &str, state: serde_json::Value) -> Result<Box<dyn PicoModel>, ModuleError> {
        if type_tag != TYPE_TAG {
            return Err(ModuleError::UnknownType(type_tag.to_string()));
        }
        let mut model: LinearModel = serde_json::from_value(state)?;
        model.bounds = self.params.bounds.clone();
        model.validate().map_err(ModuleError::InvalidState)?;
        Ok(Box::new(model))
    }
}

/// Plugin for module sources with `kind = "linear"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearKind;

impl ModelKind for LinearKind {
    fn name(&self) -> &str {
        KIND
    }

    fn compile(&self, source: &ModuleSource) -> Result<Arc<dyn ModelModule>, ModuleError> {
        let params: LinearParams = source.params_as()?;
        let probe = LinearModel {
            inputs: params.inputs.clone(),
            outputs: params.outputs.clone(),
            scale: 1.0,
            bounds: params.bounds.clone(),
        };
        probe.validate().map_err(ModuleError::InvalidParams)?;
        Ok(Arc::new(LinearModule { params }))
    }
}
