// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Cycle-safe object-graph serialization.
//!
//! `graphwire-core` flattens an in-memory graph of shared, possibly cyclic nodes into a
//! [`WireContainer`]: one opaque record per distinct node identity, indexed by a dense
//! [`SerializationId`]. A [`Deserializer`] rebuilds the graph from a container with the same
//! sharing and cycle structure as the input graph.
//!
//! # Sessions
//!
//! - [`Serializer`] walks the graph depth-first from exactly one root. Every node is
//!   registered in the [`IdentityRegistry`] *before* its [`GraphObject::serialize`] hook runs,
//!   so a reference back to a node that is still being serialized resolves to its id.
//! - [`Deserializer`] mirrors this: a fresh instance is registered in the
//!   [`MaterializedRegistry`] *before* its [`GraphObject::deserialize`] hook runs, so a
//!   reference back to it resolves to the same (still populating) [`Node`].
//!
//! Both sessions are single-use and confined to one thread ([`Node`] is `!Send`).
//!
//! # Cycles and memory
//!
//! [`Node`] is a reference-counted handle, so a cyclic graph keeps itself alive. That holds
//! for the graph you serialize and for the one a [`Deserializer`] hands back. Break cycles
//! before letting a graph go: clear the back-edges, or call [`Node::take`] on the nodes that
//! close them. If that bookkeeping is unwelcome, keep nodes in an arena owned by the caller and
//! hand out `Node`s only for the duration of a session.
//!
//! # Records
//!
//! The engine never looks inside a record. Each node type supplies a serde record type and
//! the session's [`RecordCodec`] turns it into bytes. [`CborCodec`] (canonical CBOR) is the
//! default; [`JsonCodec`] exists for human-readable dumps.
//!
//! ```
//! use graphwire_core::{
//!     CborCodec, Deserializer, GraphError, GraphObject, Node, RecordCodec, SerializationId,
//!     Serializer,
//! };
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Default)]
//! struct Peer {
//!     label: String,
//!     other: Option<Node<Peer>>,
//! }
//!
//! #[derive(Serialize, Deserialize)]
//! struct PeerRecord {
//!     label: String,
//!     other: SerializationId,
//! }
//!
//! impl GraphObject for Peer {
//!     type Record = PeerRecord;
//!
//!     fn serialize<C: RecordCodec>(
//!         &self,
//!         session: &mut Serializer<C>,
//!     ) -> Result<PeerRecord, GraphError> {
//!         Ok(PeerRecord {
//!             label: self.label.clone(),
//!             other: session.serialize_opt(self.other.as_ref())?,
//!         })
//!     }
//!
//!     fn deserialize<C: RecordCodec>(
//!         &mut self,
//!         session: &mut Deserializer<C>,
//!         record: PeerRecord,
//!     ) -> Result<(), GraphError> {
//!         self.label = record.label;
//!         self.other = session.deserialize(record.other)?;
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<(), GraphError> {
//! let a = Node::new(Peer { label: "a".into(), other: None });
//! a.borrow_mut().other = Some(a.clone());
//!
//! let mut ser = Serializer::new(CborCodec);
//! assert_eq!(ser.serialize(&a)?, SerializationId::ROOT);
//! let container = ser.into_container(false)?;
//! assert_eq!(container.len(), 1);
//!
//! let mut de = Deserializer::new(container, CborCodec)?;
//! let back = de.deserialize_root(Peer::default())?;
//! let other = back.borrow().other.clone();
//! assert!(other.is_some_and(|o| Node::ptr_eq(&o, &back)));
//! // Both graphs are self-cycles; break them so they can be freed.
//! a.take();
//! back.take();
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

pub mod canonical;
pub mod codec;
pub mod config;
pub mod container;
mod deserializer;
mod error;
mod id;
mod node;
mod record;
mod registry;
mod serializer;

pub use canonical::{decode_value, encode_value, CanonError};
pub use config::{ConfigError, EngineConfig};
pub use container::{ContainerError, ContainerSummary, WireContainer, FORMAT_VERSION};
pub use deserializer::Deserializer;
pub use error::GraphError;
pub use id::SerializationId;
pub use node::{GraphObject, Node, NodeIdentity};
pub use record::{CborCodec, JsonCodec, RecordCodec, RecordError};
pub use registry::{IdentityRegistry, MaterializedRegistry};
pub use serializer::Serializer;
