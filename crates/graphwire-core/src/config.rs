// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Session and container limits.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// A field holds a value the engine cannot work with.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Limits shared by [`Serializer`](crate::Serializer), [`Deserializer`](crate::Deserializer)
/// and the [`WireContainer`](crate::WireContainer) envelope.
///
/// Missing fields in a JSON document fall back to [`EngineConfig::default`]; unknown fields
/// are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum number of distinct nodes (records) in one container.
    pub max_records: u32,
    /// Maximum encoded size of a single record, in bytes.
    pub max_record_len: usize,
    /// Maximum length of a debug type name, in bytes.
    pub max_type_name_len: usize,
    /// Maximum reference-chain depth a session will recurse into.
    pub max_depth: usize,
    /// Check debug type names (when present) against the requested node type on decode.
    pub verify_type_names: bool,
}

impl EngineConfig {
    /// Default record limit.
    pub const DEFAULT_MAX_RECORDS: u32 = 1 << 20;
    /// Default per-record byte limit (16 MiB).
    pub const DEFAULT_MAX_RECORD_LEN: usize = 16 * 1024 * 1024;
    /// Default type-name byte limit.
    pub const DEFAULT_MAX_TYPE_NAME_LEN: usize = 1024;
    /// Default traversal depth.
    ///
    /// Sessions recurse once per level, so this has to fit a 2 MiB thread stack in an
    /// unoptimized build. Raise it only together with the stack size of the calling thread.
    pub const DEFAULT_MAX_DEPTH: usize = 256;

    /// Parse a JSON config document and validate it.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as pretty JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, ConfigError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Reject limits no session could run under.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_records == 0 {
            return Err(ConfigError::Invalid {
                field: "max_records",
                reason: "must be at least 1",
            });
        }
        // The top id is the nil sentinel.
        if self.max_records == u32::MAX {
            return Err(ConfigError::Invalid {
                field: "max_records",
                reason: "must leave room for the nil id",
            });
        }
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_depth",
                reason: "must be at least 1",
            });
        }
        if u32::try_from(self.max_record_len).is_err() {
            return Err(ConfigError::Invalid {
                field: "max_record_len",
                reason: "must fit in a u32 length prefix",
            });
        }
        Ok(())
    }

    /// Builder-style override of [`EngineConfig::max_depth`].
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Builder-style override of [`EngineConfig::max_record_len`].
    pub fn with_max_record_len(mut self, max_record_len: usize) -> Self {
        self.max_record_len = max_record_len;
        self
    }

    /// Builder-style override of [`EngineConfig::max_records`].
    pub fn with_max_records(mut self, max_records: u32) -> Self {
        self.max_records = max_records;
        self
    }

    /// Builder-style override of [`EngineConfig::verify_type_names`].
    pub fn with_verify_type_names(mut self, verify: bool) -> Self {
        self.verify_type_names = verify;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_records: Self::DEFAULT_MAX_RECORDS,
            max_record_len: Self::DEFAULT_MAX_RECORD_LEN,
            max_type_name_len: Self::DEFAULT_MAX_TYPE_NAME_LEN,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            verify_type_names: false,
        }
    }
}
