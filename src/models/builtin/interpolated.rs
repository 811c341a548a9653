//! `interpolated` kind: vector outputs tabulated over one scalar input.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::contract::{require_input, select_outputs, CantCompute, Inputs, Outputs, PicoModel};
use crate::models::module::{ModelKind, ModelModule, ModuleError, ModuleSource};

pub const KIND: &str = "interpolated";
pub const TYPE_TAG: &str = "interpolated.InterpolatedModel";

/// Piecewise-linear interpolation of tabulated vectors.
///
/// `table[name][i]` is the value of output `name` at `grid[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolatedModel {
    input: String,
    grid: Vec<f64>,
    table: BTreeMap<String, Vec<Vec<f64>>>,
}

impl InterpolatedModel {
    fn validate(&self) -> Result<(), String> {
        if self.grid.len() < 2 {
            return Err(format!("grid needs at least 2 points, got {}", self.grid.len()));
        }
        if self.grid.iter().any(|g| !g.is_finite()) {
            return Err("grid values must be finite".into());
        }
        if self.grid.windows(2).any(|w| w[0] >= w[1]) {
            return Err("grid must be strictly ascending".into());
        }
        if self.table.is_empty() {
            return Err("at least one output is required".into());
        }
        for (name, rows) in &self.table {
            if rows.len() != self.grid.len() {
                return Err(format!(
                    "output '{}' has {} rows, grid has {} points",
                    name,
                    rows.len(),
                    self.grid.len()
                ));
            }
            let width = rows[0].len();
            if rows.iter().any(|r| r.len() != width) {
                return Err(format!("output '{}' has rows of differing length", name));
            }
            if rows.iter().flatten().any(|v| !v.is_finite()) {
                return Err(format!("output '{}' has non-finite values", name));
            }
        }
        Ok(())
    }
}

impl PicoModel for InterpolatedModel {
    fn inputs(&self) -> Vec<String> {
        vec![self.input.clone()]
    }

    fn outputs(&self) -> Vec<String> {
        self.table.keys().cloned().collect()
    }

    fn evaluate(&self, outputs: Option<&[String]>, inputs: &Inputs) -> Result<Outputs, CantCompute> {
        let selected = select_outputs(&self.outputs(), outputs)?;
        let x = require_input(inputs, &self.input)?;

        let (lo, hi) = (self.grid[0], self.grid[self.grid.len() - 1]);
        if x < lo || x > hi {
            return Err(CantCompute::OutOfBounds {
                name: self.input.clone(),
                value: x,
                min: lo,
                max: hi,
            });
        }

        // Index of the segment [grid[i], grid[i + 1]] containing x.
        let i = self
            .grid
            .partition_point(|g| *g <= x)
            .saturating_sub(1)
            .min(self.grid.len() - 2);
        let t = (x - self.grid[i]) / (self.grid[i + 1] - self.grid[i]);

        let mut result = Outputs::new();
        for name in selected {
            let rows = &self.table[&name];
            let values = rows[i]
                .iter()
                .zip(&rows[i + 1])
                .map(|(a, b)| a + t * (b - a))
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

#[derive(Debug, Clone, Deserialize)]
struct InterpolatedParams {
    input: String,
    grid: Vec<f64>,
    outputs: BTreeMap<String, Vec<Vec<f64>>>,
}

struct InterpolatedModule {
    template: InterpolatedModel,
}

impl ModelModule for InterpolatedModule {
    fn construct(&self, args: &[serde_json::Value]) -> Result<Box<dyn PicoModel>, ModuleError> {
        if !args.is_empty() {
            return Err(ModuleError::InvalidArgs(format!(
                "interpolated models take no arguments, got {}",
                args.len()
            )));
        }
        Ok(Box::new(self.template.clone()))
    }

    fn restore(&self, type_tag: &str, state: serde_json::Value) -> Result<Box<dyn PicoModel>, ModuleError> {
        if type_tag != TYPE_TAG {
            return Err(ModuleError::UnknownType(type_tag.to_string()));
        }
        let model: InterpolatedModel = serde_json::from_value(state)?;
        model.validate().map_err(ModuleError::InvalidState)?;
        Ok(Box::new(model))
    }
}

/// Plugin for module sources with `kind = "interpolated"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpolatedKind;

impl ModelKind for InterpolatedKind {
    fn name(&self) -> &str {
        KIND
    }

    fn compile(&self, source: &ModuleSource) -> Result<Arc<dyn ModelModule>, ModuleError> {
        let params: InterpolatedParams = source.params_as()?;
        let template = InterpolatedModel {
            input: params.input,
            grid: params.grid,
            table: params.outputs,
        };
        template.validate().map_err(ModuleError::InvalidParams)?;
        Ok(Arc::new(InterpolatedModule { template }))
    }
}
