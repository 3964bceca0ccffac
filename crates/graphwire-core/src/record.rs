// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Delegate codecs that turn per-node records into opaque byte blobs.

use ciborium::value::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::canonical::{self, CanonError};

/// Failure inside a [`RecordCodec`].
#[derive(Debug, Error)]
pub enum RecordError {
    /// serde could not map the record to or from a CBOR value.
    #[error("cbor value mapping: {0}")]
    Cbor(String),
    /// The bytes are not canonical CBOR.
    #[error("canonical cbor: {0}")]
    Canonical(#[from] CanonError),
    /// serde_json failure.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    /// Custom codec failure.
    #[error("{0}")]
    Other(String),
}

/// Per-record byte codec used by both sessions.
///
/// The engine treats the output as opaque; only the node type's own
/// [`GraphObject`](crate::GraphObject) glue knows the record layout.
pub trait RecordCodec {
    /// Short codec name for logs.
    fn name(&self) -> &'static str;

    /// Encode one record.
    fn encode_record<R: Serialize>(&self, record: &R) -> Result<Vec<u8>, RecordError>;

    /// Decode one record.
    fn decode_record<R: DeserializeOwned>(&self, bytes: &[u8]) -> Result<R, RecordError>;
}

impl<C: RecordCodec + ?Sized> RecordCodec for &C {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn encode_record<R: Serialize>(&self, record: &R) -> Result<Vec<u8>, RecordError> {
        (**self).encode_record(record)
    }

    fn decode_record<R: DeserializeOwned>(&self, bytes: &[u8]) -> Result<R, RecordError> {
        (**self).decode_record(bytes)
    }
}

/// Canonical CBOR records (see [`canonical`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CborCodec;

impl RecordCodec for CborCodec {
    fn name(&self) -> &'static str {
        "cbor"
    }

    fn encode_record<R: Serialize>(&self, record: &R) -> Result<Vec<u8>, RecordError> {
        let value = Value::serialized(record).map_err(|e| RecordError::Cbor(e.to_string()))?;
        Ok(canonical::encode_value(&value)?)
    }

    fn decode_record<R: DeserializeOwned>(&self, bytes: &[u8]) -> Result<R, RecordError> {
        let value = canonical::decode_value(bytes)?;
        value
            .deserialized()
            .map_err(|e| RecordError::Cbor(e.to_string()))
    }
}

/// JSON records; larger than CBOR but readable in dumps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec;

impl RecordCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode_record<R: Serialize>(&self, record: &R) -> Result<Vec<u8>, RecordError> {
        Ok(serde_json::to_vec(record)?)
    }

    fn decode_record<R: DeserializeOwned>(&self, bytes: &[u8]) -> Result<R, RecordError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
