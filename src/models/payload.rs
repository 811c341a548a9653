//! Payload codec: the serialized form of a model instance.
//!
//! The payload format evolves independently from the container layout. The
//! current schema is a JSON envelope:
//!
//! ```json
//! {"schema": 2, "type": "linear.LinearModel", "state": {...}}
//! ```
//!
//! Schema 1 payloads (`{"type": ..., "fields": ...}`, no `schema` key) are
//! migrated forward on read. Payloads from a newer schema are rejected.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::contract::PicoModel;
use super::module::ModuleError;
use super::registry::CodeUnit;

/// Payload schema written by [`encode_model`].
pub const PAYLOAD_SCHEMA: u64 = 2;

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("model state could not be serialized: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("payload schema {found} is newer than supported schema {supported}")]
    UnsupportedSchema { found: u64, supported: u64 },

    #[error("module could not restore payload: {0}")]
    Restore(#[source] ModuleError),
}

/// Current payload envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadEnvelope {
    pub schema: u64,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub state: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct PayloadV1 {
    #[serde(rename = "type")]
    type_tag: String,
    fields: serde_json::Value,
}

/// Every payload schema this library can read.
#[derive(Debug)]
enum StoredPayload {
    V1(PayloadV1),
    V2(PayloadEnvelope),
}

impl StoredPayload {
    fn parse(bytes: &[u8]) -> Result<Self, PayloadError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| PayloadError::Malformed(e.to_string()))?;
        let schema = match value.get("schema") {
            None => 1,
            Some(raw) => raw
                .as_u64()
                .ok_or_else(|| PayloadError::Malformed(format!("schema is not an integer: {}", raw)))?,
        };
        let malformed = |e: serde_json::Error| PayloadError::Malformed(e.to_string());
        match schema {
            1 => Ok(Self::V1(serde_json::from_value(value).map_err(malformed)?)),
            PAYLOAD_SCHEMA => Ok(Self::V2(serde_json::from_value(value).map_err(malformed)?)),
            found => Err(PayloadError::UnsupportedSchema {
                found,
                supported: PAYLOAD_SCHEMA,
            }),
        }
    }

    fn upgrade(self) -> PayloadEnvelope {
        match self {
            Self::V1(old) => PayloadEnvelope {
                schema: PAYLOAD_SCHEMA,
                type_tag: old.type_tag,
                state: old.fields,
            },
            Self::V2(current) => current,
        }
    }
}

/// Serialize a model into payload bytes.
pub fn encode_model(model: &dyn PicoModel) -> Result<Vec<u8>, PayloadError> {
    let envelope = PayloadEnvelope {
        schema: PAYLOAD_SCHEMA,
        type_tag: model.type_tag().to_string(),
        state: model.state().map_err(PayloadError::Encode)?,
    };
    serde_json::to_vec(&envelope).map_err(PayloadError::Encode)
}

/// Parse payload bytes of any supported schema into the current envelope.
pub fn decode_envelope(bytes: &[u8]) -> Result<PayloadEnvelope, PayloadError> {
    Ok(StoredPayload::parse(bytes)?.upgrade())
}

/// Restore a model from payload bytes using the module that owns its type.
pub fn restore_model(unit: &CodeUnit, bytes: &[u8]) -> Result<Box<dyn PicoModel>, PayloadError> {
    let envelope = decode_envelope(bytes)?;
    unit.restore(&envelope.type_tag, envelope.state)
        .map_err(PayloadError::Restore)
}
