//! Model kinds shipped with the crate.

pub mod interpolated;
pub mod linear;

pub use interpolated::{InterpolatedKind, InterpolatedModel};
pub use linear::{LinearKind, LinearModel, LinearOutput};
