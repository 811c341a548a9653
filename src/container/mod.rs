//! PICO container format.
//!
//! A container is the persisted unit of a datafile: the module source code,
//! the logical name it is registered under, the library version that wrote it
//! and the opaque model payload. This module owns the byte layout, the version
//! compatibility rules and the atomic write path; it never looks inside the
//! payload.

mod atomic;
mod codec;
mod file;
pub mod version;

pub use atomic::{write_atomic, write_atomic_with};
pub use codec::{
    decode, decode_with_revision, encode, encode_with, get_codec, ContainerCodec, FormatError,
    V1Codec, V2Codec, CURRENT_REVISION, MAGIC,
};
pub use file::MappedContainer;
pub use version::{FormatVersion, VersionCheck, VersionParseError};

/// The four logical fields of a datafile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    /// Source text of the embedded model module.
    pub code: String,
    /// Namespace slot the code is registered under at runtime.
    pub logical_name: String,
    /// Dotted library version that wrote the container. Absent in legacy files.
    pub format_version: Option<String>,
    /// Serialized model instance, passed through untouched.
    pub payload: Vec<u8>,
}

impl Container {
    pub fn new(
        code: impl Into<String>,
        logical_name: impl Into<String>,
        format_version: Option<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            code: code.into(),
            logical_name: logical_name.into(),
            format_version,
            payload,
        }
    }

    /// Size of the payload blob in bytes.
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}
