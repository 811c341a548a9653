//! Datafile operations: load, create and convert.
//!
//! These sit on top of [`crate::container`] (bytes on disk) and
//! [`crate::models`] (code materialization and payloads).

mod convert;
mod creator;
mod loader;

pub use convert::{converted_path, ConvertReport, Converter};
pub use creator::{generate_logical_name, CreateReport, Creator, LOGICAL_NAME_PREFIX};
pub use loader::{LoadOptions, LoadWarning, LoadedModel, Loader};
