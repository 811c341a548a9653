//! The model contract every datafile payload implements.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Named scalar inputs.
pub type Inputs = BTreeMap<String, f64>;

/// Named vector outputs.
pub type Outputs = BTreeMap<String, Vec<f64>>;

/// Raised when a model cannot compute a result for the given request.
///
/// Loader and creator never swallow this; it reaches the caller unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CantCompute {
    #[error("missing required input '{0}'")]
    MissingInput(String),

    #[error("unknown output '{0}'")]
    UnknownOutput(String),

    #[error("input '{name}' = {value} is outside [{min}, {max}]")]
    OutOfBounds {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("input '{0}' is not a finite number")]
    NotFinite(String),

    #[error("{0}")]
    Other(String),
}

/// A mapping from named scalar inputs to named vector outputs.
pub trait PicoModel: Send + Sync + fmt::Debug {
    /// Names of valid inputs.
    fn inputs(&self) -> Vec<String>;

    /// Names of possible outputs.
    fn outputs(&self) -> Vec<String>;

    /// Evaluate the model.
    ///
    /// `outputs` selects a subset to compute; `None` computes every output
    /// listed by [`PicoModel::outputs`].
    fn evaluate(&self, outputs: Option<&[String]>, inputs: &Inputs) -> Result<Outputs, CantCompute>;

    /// Identifies the concrete model type inside its module's payloads.
    fn type_tag(&self) -> &str;

    /// Serializable state, restored later by the owning module.
    fn state(&self) -> Result<serde_json::Value, serde_json::Error>;
}

/// Resolve a requested output selection against what a model offers.
pub fn select_outputs(available: &[String], requested: Option<&[String]>) -> Result<Vec<String>, CantCompute> {
    match requested {
        None => Ok(available.to_vec()),
        Some(names) => names
            .iter()
            .map(|name| {
                if available.contains(name) {
                    Ok(name.clone())
                } else {
                    Err(CantCompute::UnknownOutput(name.clone()))
                }
            })
            .collect(),
    }
}

/// Fetch a required finite input.
pub fn require_input(inputs: &Inputs, name: &str) -> Result<f64, CantCompute> {
    let value = *inputs
        .get(name)
        .ok_or_else(|| CantCompute::MissingInput(name.to_string()))?;
    if !value.is_finite() {
        return Err(CantCompute::NotFinite(name.to_string()));
    }
    Ok(value)
}
