// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Versioned array-of-records container and its binary envelope.
//!
//! Envelope layout (v1), all integers `u32` little-endian:
//!
//! - `format_version`
//! - `record_count`, then `record_count` × (`len`, `len` bytes)
//! - `has_type_names`: one byte, 0 or 1
//! - if set: `name_count` (must equal `record_count`), then `name_count` × (`len`, UTF-8)
//!
//! Nothing may follow the last field. The envelope does not care which
//! [`RecordCodec`](crate::RecordCodec) produced the records.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::codec::{CodecError, Reader, Writer};
use crate::EngineConfig;

/// Current container format version.
pub const FORMAT_VERSION: u32 = 1;

/// Structural container failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContainerError {
    /// Version 0 is never written.
    #[error("invalid container version 0")]
    InvalidVersion,
    /// The container was written by a newer format.
    #[error("container version {found} is newer than supported version {supported}")]
    FutureVersion {
        /// Version found in the container.
        found: u32,
        /// Newest version this build reads.
        supported: u32,
    },
    /// Debug type names do not line up with records.
    #[error("{names} type names for {records} records")]
    TypeNameCount {
        /// Number of type names.
        names: usize,
        /// Number of records.
        records: usize,
    },
    /// More records than the configured limit.
    #[error("{count} records exceed limit {limit}")]
    TooManyRecords {
        /// Records in the container.
        count: usize,
        /// Configured limit.
        limit: u32,
    },
    /// One record is larger than the configured limit.
    #[error("record {index} is {len} bytes, limit {limit}")]
    RecordTooLarge {
        /// Offending record index.
        index: usize,
        /// Its length.
        len: usize,
        /// Configured limit.
        limit: usize,
    },
    /// One type name is longer than the configured limit.
    #[error("type name {index} is {len} bytes, limit {limit}")]
    TypeNameTooLong {
        /// Offending index.
        index: usize,
        /// Its length.
        len: usize,
        /// Configured limit.
        limit: usize,
    },
    /// Bytes remain after the envelope.
    #[error("{0} trailing bytes after container")]
    Trailing(usize),
    /// Low-level envelope read/write failure.
    #[error("envelope: {0}")]
    Codec(#[from] CodecError),
}

/// Output of one serialization pass: one opaque record per [`SerializationId`](crate::SerializationId).
///
/// `records[k]` is the record of id `k`; there are no gaps. `type_names`, when present, is a
/// debug side table parallel to `records` and is never needed for decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireContainer {
    /// Envelope format version.
    pub format_version: u32,
    /// Encoded records, indexed by id.
    pub records: Vec<Vec<u8>>,
    /// Optional Rust type name of each record's node.
    pub type_names: Option<Vec<String>>,
}

/// Size overview of a container, for logs and tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerSummary {
    /// Envelope format version.
    pub format_version: u32,
    /// Number of records.
    pub record_count: usize,
    /// Sum of all record lengths.
    pub total_record_bytes: usize,
    /// Whether the debug type-name table is present.
    pub has_type_names: bool,
}

impl WireContainer {
    /// Container at the current format version.
    pub fn new(records: Vec<Vec<u8>>, type_names: Option<Vec<String>>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            records,
            type_names,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the container holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Debug type name recorded for `index`, if the side table is present.
    pub fn type_name(&self, index: usize) -> Option<&str> {
        self.type_names
            .as_ref()
            .and_then(|names| names.get(index))
            .map(String::as_str)
    }

    /// Size overview.
    pub fn summary(&self) -> ContainerSummary {
        ContainerSummary {
            format_version: self.format_version,
            record_count: self.records.len(),
            total_record_bytes: self.records.iter().map(Vec::len).sum(),
            has_type_names: self.type_names.is_some(),
        }
    }

    /// Check version, table shapes and size limits.
    pub fn validate(&self, config: &EngineConfig) -> Result<(), ContainerError> {
        check_version(self.format_version)?;
        if self.records.len() > config.max_records as usize {
            return Err(ContainerError::TooManyRecords {
                count: self.records.len(),
                limit: config.max_records,
            });
        }
        if let Some((index, record)) = self
            .records
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() > config.max_record_len)
        {
            return Err(ContainerError::RecordTooLarge {
                index,
                len: record.len(),
                limit: config.max_record_len,
            });
        }
        if let Some(names) = &self.type_names {
            if names.len() != self.records.len() {
                return Err(ContainerError::TypeNameCount {
                    names: names.len(),
                    records: self.records.len(),
                });
            }
            if let Some((index, name)) = names
                .iter()
                .enumerate()
                .find(|(_, n)| n.len() > config.max_type_name_len)
            {
                return Err(ContainerError::TypeNameTooLong {
                    index,
                    len: name.len(),
                    limit: config.max_type_name_len,
                });
            }
        }
        Ok(())
    }

    /// Encode the binary envelope.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ContainerError> {
        let payload: usize = self.records.iter().map(|r| r.len() + 4).sum();
        let mut w = Writer::with_capacity(payload + 16);
        w.write_u32_le(self.format_version);
        w.write_count(self.records.len())?;
        for record in &self.records {
            w.write_len_prefixed_bytes(record)?;
        }
        w.write_flag(self.type_names.is_some());
        if let Some(names) = &self.type_names {
            w.write_count(names.len())?;
            for name in names {
                w.write_string(name, u32::MAX as usize)?;
            }
        }
        Ok(w.into_vec())
    }

    /// Decode and validate an envelope under default limits.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ContainerError> {
        Self::from_bytes_with(bytes, &EngineConfig::default())
    }

    /// Decode and validate an envelope under `config` limits.
    ///
    /// Counts and lengths are checked against the limits before anything is allocated.
    pub fn from_bytes_with(bytes: &[u8], config: &EngineConfig) -> Result<Self, ContainerError> {
        let result = decode_envelope(bytes, config);
        if let Err(err) = &result {
            warn!(len = bytes.len(), %err, "rejected wire container");
        }
        result
    }
}

fn check_version(version: u32) -> Result<(), ContainerError> {
    match version {
        0 => Err(ContainerError::InvalidVersion),
        v if v > FORMAT_VERSION => Err(ContainerError::FutureVersion {
            found: v,
            supported: FORMAT_VERSION,
        }),
        _ => Ok(()),
    }
}

fn decode_envelope(bytes: &[u8], config: &EngineConfig) -> Result<WireContainer, ContainerError> {
    let mut r = Reader::new(bytes);
    let format_version = r.read_u32_le()?;
    check_version(format_version)?;

    let count = r.read_u32_le()? as usize;
    if count > config.max_records as usize {
        return Err(ContainerError::TooManyRecords {
            count,
            limit: config.max_records,
        });
    }
    // Each record needs at least its 4-byte prefix.
    let mut records = Vec::with_capacity(count.min(r.remaining() / 4));
    for index in 0..count {
        let record = r
            .read_len_prefixed_bytes(config.max_record_len)
            .map_err(|err| match err {
                CodecError::LengthTooLarge { len, max } => ContainerError::RecordTooLarge {
                    index,
                    len,
                    limit: max,
                },
                other => other.into(),
            })?;
        records.push(record.to_vec());
    }

    let type_names = if r.read_flag()? {
        let names = r.read_u32_le()? as usize;
        if names != count {
            return Err(ContainerError::TypeNameCount {
                names,
                records: count,
            });
        }
        let mut out = Vec::with_capacity(names.min(r.remaining() / 4));
        for index in 0..names {
            let name = r
                .read_string(config.max_type_name_len)
                .map_err(|err| match err {
                    CodecError::LengthTooLarge { len, max } => ContainerError::TypeNameTooLong {
                        index,
                        len,
                        limit: max,
                    },
                    other => other.into(),
                })?;
            out.push(name);
        }
        Some(out)
    } else {
        None
    };

    if r.remaining() != 0 {
        return Err(ContainerError::Trailing(r.remaining()));
    }
    Ok(WireContainer {
        format_version,
        records,
        type_names,
    })
}
