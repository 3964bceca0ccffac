// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engine-level error type.

use thiserror::Error;

use crate::{ContainerError, RecordError, SerializationId};

/// Errors produced by [`Serializer`](crate::Serializer) and
/// [`Deserializer`](crate::Deserializer) sessions.
///
/// Sessions are all-or-nothing: once an error escapes a root call, no container or object
/// graph from that session should be used.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A second, unrelated root was passed to a serializer that already ran a root pass.
    ///
    /// This is a programmer error, not a data error.
    #[error("only one root object is allowed per serializer")]
    RootAlreadySerialized,
    /// The pass discovered more distinct nodes than the configured (or representable) limit.
    #[error("object graph exceeds {limit} distinct nodes")]
    TooManyObjects {
        /// Limit that was hit.
        limit: u32,
    },
    /// The reference chain is deeper than the configured traversal depth.
    #[error("reference chain deeper than {limit} nodes")]
    DepthLimit {
        /// Limit that was hit.
        limit: usize,
    },
    /// A node could not be borrowed because the caller holds a conflicting borrow.
    #[error("node {id} is already borrowed")]
    NodeBorrowed {
        /// Id assigned to the node.
        id: SerializationId,
    },
    /// The delegate codec failed to encode a record.
    #[error("failed to encode record {id} ({type_name}): {source}")]
    Encode {
        /// Id of the failing record.
        id: SerializationId,
        /// Rust type of the node that produced it.
        type_name: &'static str,
        /// Codec failure.
        #[source]
        source: RecordError,
    },
    /// An encoded record is larger than [`EngineConfig::max_record_len`](crate::EngineConfig).
    #[error("record {id} ({type_name}) is {len} bytes, limit {limit}")]
    RecordTooLarge {
        /// Id of the oversized record.
        id: SerializationId,
        /// Rust type of the node that produced it.
        type_name: &'static str,
        /// Encoded length.
        len: usize,
        /// Configured limit.
        limit: usize,
    },
    /// The delegate codec failed to decode a record.
    #[error("failed to decode record {id} as {type_name}: {source}")]
    Decode {
        /// Id of the failing record.
        id: SerializationId,
        /// Rust type the caller asked for.
        type_name: &'static str,
        /// Codec failure.
        #[source]
        source: RecordError,
    },
    /// A record slot was never filled; the traversal failed or never ran to completion.
    #[error("record {id} was never produced")]
    IncompleteGraph {
        /// First missing id.
        id: SerializationId,
    },
    /// An embedded id points past the end of the record table.
    #[error("record {id} does not exist (container holds {count} records)")]
    UnknownId {
        /// Offending id.
        id: SerializationId,
        /// Number of records in the container.
        count: usize,
    },
    /// The container holds no records, so there is no root to decode.
    #[error("wire container is empty")]
    EmptyContainer,
    /// A required reference was nil.
    #[error("required reference to {type_name} is nil")]
    NilReference {
        /// Rust type the caller asked for.
        type_name: &'static str,
    },
    /// An id was requested as one node type but belongs to another.
    #[error("record {id} is not a {expected} (found {found})")]
    TypeMismatch {
        /// Offending id.
        id: SerializationId,
        /// Rust type the caller asked for.
        expected: &'static str,
        /// What the id actually holds, as far as it is known.
        found: String,
    },
    /// An earlier call on this deserializer failed, so nodes it already registered may be
    /// half populated.
    #[error("deserializer session already failed")]
    SessionFailed,
    /// The container failed structural validation.
    #[error(transparent)]
    Container(#[from] ContainerError),
}
