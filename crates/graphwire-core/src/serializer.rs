// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Depth-first graph flattening from a single root.

use std::any::type_name;

use serde::Serialize;
use tracing::{debug, error, instrument};

use crate::{
    CborCodec, EngineConfig, GraphError, GraphObject, IdentityRegistry, Node, RecordCodec,
    RecordError, SerializationId, WireContainer,
};

/// A record waiting for [`Serializer::into_container`].
trait PendingRecord<C> {
    fn encode(&self, codec: &C) -> Result<Vec<u8>, RecordError>;
    fn type_name(&self) -> &'static str;
}

struct Pending<R> {
    record: R,
    type_name: &'static str,
}

impl<C: RecordCodec, R: Serialize> PendingRecord<C> for Pending<R> {
    fn encode(&self, codec: &C) -> Result<Vec<u8>, RecordError> {
        codec.encode_record(&self.record)
    }

    fn type_name(&self) -> &'static str {
        self.type_name
    }
}

type Slot<C> = Option<Box<dyn PendingRecord<C>>>;

/// Id-indexed record buffer.
///
/// Ids are assigned before their records exist (children finish first), so the table is
/// sized by id rather than pushed to; it at least doubles whenever an id lands past the end.
struct RecordSlots<C> {
    slots: Vec<Slot<C>>,
}

impl<C> RecordSlots<C> {
    const MIN_CAPACITY: usize = 8;

    fn new() -> Self {
        Self { slots: Vec::new() }
    }

    fn store(&mut self, index: usize, record: Box<dyn PendingRecord<C>>) {
        if index >= self.slots.len() {
            let grown = (self.slots.len() * 2)
                .max(index + 1)
                .max(Self::MIN_CAPACITY);
            self.slots.resize_with(grown, || None);
        }
        self.slots[index] = Some(record);
    }

    fn get(&self, index: usize) -> Option<&dyn PendingRecord<C>> {
        self.slots.get(index).and_then(Option::as_deref)
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// Single-use session that flattens one object graph into a [`WireContainer`].
///
/// Call [`serialize`](Serializer::serialize) once with the root. The root's
/// [`GraphObject::serialize`] hook calls back into the same session for each referenced node;
/// those nested calls are part of the same pass. Any further top-level call fails with
/// [`GraphError::RootAlreadySerialized`]. Finish with
/// [`into_container`](Serializer::into_container).
pub struct Serializer<C = CborCodec> {
    codec: C,
    config: EngineConfig,
    registry: IdentityRegistry,
    records: RecordSlots<C>,
    depth: usize,
    root_taken: bool,
}

impl<C: RecordCodec> Serializer<C> {
    /// Session with default limits.
    pub fn new(codec: C) -> Self {
        Self::with_config(codec, EngineConfig::default())
    }

    /// Session with explicit limits.
    pub fn with_config(codec: C, config: EngineConfig) -> Self {
        Self {
            codec,
            config,
            registry: IdentityRegistry::new(),
            records: RecordSlots::new(),
            depth: 0,
            root_taken: false,
        }
    }

    /// Serialize `node` and return its id.
    ///
    /// Outside a traversal this starts the root pass; inside a hook it serializes a child. A
    /// node already seen in this pass returns its existing id without running its hook again,
    /// which is what terminates cycles and deduplicates shared nodes.
    pub fn serialize<T: GraphObject>(
        &mut self,
        node: &Node<T>,
    ) -> Result<SerializationId, GraphError> {
        if self.depth > 0 {
            return self.visit(node);
        }
        if self.root_taken {
            error!(
                node = type_name::<T>(),
                "serializer already ran a root pass; only one root object is allowed"
            );
            return Err(GraphError::RootAlreadySerialized);
        }
        self.root_taken = true;
        let id = self.visit(node)?;
        debug!(
            %id,
            objects = self.registry.len(),
            root = type_name::<T>(),
            "root pass complete"
        );
        Ok(id)
    }

    /// Serialize an optional reference; `None` yields [`SerializationId::NIL`] and touches nothing.
    pub fn serialize_opt<T: GraphObject>(
        &mut self,
        node: Option<&Node<T>>,
    ) -> Result<SerializationId, GraphError> {
        node.map_or(Ok(SerializationId::NIL), |n| self.serialize(n))
    }

    /// Serialize every node in `nodes`, in order.
    ///
    /// Meant for list fields inside a hook; at the top level the second element would be a
    /// second root.
    pub fn serialize_all<T: GraphObject>(
        &mut self,
        nodes: &[Node<T>],
    ) -> Result<Vec<SerializationId>, GraphError> {
        nodes.iter().map(|n| self.serialize(n)).collect()
    }

    fn visit<T: GraphObject>(&mut self, node: &Node<T>) -> Result<SerializationId, GraphError> {
        if let Some(id) = self.registry.lookup(node.identity()) {
            return Ok(id);
        }
        if self.depth >= self.config.max_depth {
            return Err(GraphError::DepthLimit {
                limit: self.config.max_depth,
            });
        }
        // Register before recursing: a path back to `node` must find this id.
        let id = self.registry.register(node, self.config.max_records)?;
        let Some(index) = id.index() else {
            return Err(GraphError::TooManyObjects {
                limit: self.config.max_records,
            });
        };

        self.depth += 1;
        let record = match node.try_borrow() {
            Ok(value) => value.serialize(self),
            Err(_) => Err(GraphError::NodeBorrowed { id }),
        };
        self.depth -= 1;

        self.records.store(
            index,
            Box::new(Pending {
                record: record?,
                type_name: type_name::<T>(),
            }),
        );
        Ok(id)
    }

    /// Distinct nodes registered so far.
    pub fn object_count(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` while a root pass is running (i.e. inside a hook).
    pub fn in_traversal(&self) -> bool {
        self.depth > 0
    }

    /// Encode every buffered record and produce the container.
    ///
    /// With `include_type_names` the container also carries each record's Rust type name for
    /// inspection. Fails without a partial result if any record is missing or fails to encode.
    #[instrument(skip_all, fields(codec = self.codec.name(), objects = self.registry.len()))]
    pub fn into_container(self, include_type_names: bool) -> Result<WireContainer, GraphError> {
        let count = self.registry.len();
        let mut records = Vec::with_capacity(count);
        let mut names = include_type_names.then(|| Vec::with_capacity(count));

        for index in 0..count {
            let id = SerializationId::from_index(index).unwrap_or(SerializationId::NIL);
            let pending = self
                .records
                .get(index)
                .ok_or(GraphError::IncompleteGraph { id })?;
            let bytes = pending
                .encode(&self.codec)
                .map_err(|source| GraphError::Encode {
                    id,
                    type_name: pending.type_name(),
                    source,
                })?;
            if bytes.len() > self.config.max_record_len {
                return Err(GraphError::RecordTooLarge {
                    id,
                    type_name: pending.type_name(),
                    len: bytes.len(),
                    limit: self.config.max_record_len,
                });
            }
            records.push(bytes);
            if let Some(names) = names.as_mut() {
                names.push(pending.type_name().to_owned());
            }
        }

        let container = WireContainer::new(records, names);
        let summary = container.summary();
        debug!(
            records = summary.record_count,
            bytes = summary.total_record_bytes,
            slots = self.records.capacity(),
            type_names = summary.has_type_names,
            "wire container built"
        );
        Ok(container)
    }
}

impl<C> std::fmt::Debug for Serializer<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Serializer")
            .field("registry", &self.registry)
            .field("depth", &self.depth)
            .field("root_taken", &self.root_taken)
            .finish_non_exhaustive()
    }
}
