// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identity ↔ id tables for one session.
//!
//! [`IdentityRegistry`] answers "has this node been seen, and under which id" while
//! serializing. [`MaterializedRegistry`] answers "has this id been turned into a node yet"
//! while deserializing. Both are filled *before* a node's hook runs; that ordering is what
//! makes cycles terminate.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::{GraphError, Node, NodeIdentity, SerializationId};

/// Node identity → [`SerializationId`] for one serialization pass.
///
/// Ids are handed out from a counter that starts unset: the first registration yields id 0,
/// every later one the previous id plus one. The registry keeps a handle to every registered
/// node until it is dropped, so no identity can be freed and reused mid-pass.
#[derive(Default)]
pub struct IdentityRegistry {
    ids: HashMap<NodeIdentity, SerializationId>,
    anchors: Vec<Rc<dyn Any>>,
    last: Option<SerializationId>,
}

impl IdentityRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id previously assigned to `identity`.
    pub fn lookup(&self, identity: NodeIdentity) -> Option<SerializationId> {
        self.ids.get(&identity).copied()
    }

    /// Assign the next id to `node`, or return the id it already has.
    ///
    /// Fails with [`GraphError::TooManyObjects`] once `limit` ids have been handed out.
    pub fn register<T: 'static>(
        &mut self,
        node: &Node<T>,
        limit: u32,
    ) -> Result<SerializationId, GraphError> {
        let identity = node.identity();
        if let Some(id) = self.lookup(identity) {
            return Ok(id);
        }
        let next = self.last.map_or(0, |last| last.0.saturating_add(1));
        if next >= limit || next == SerializationId::NIL.0 {
            return Err(GraphError::TooManyObjects { limit });
        }
        let id = SerializationId(next);
        self.ids.insert(identity, id);
        self.anchors.push(node.erase());
        self.last = Some(id);
        trace!(%id, node = type_name::<T>(), "registered");
        Ok(id)
    }

    /// Number of registered identities.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Returns `true` before the first registration.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Most recently assigned id.
    pub fn last_id(&self) -> Option<SerializationId> {
        self.last
    }
}

impl std::fmt::Debug for IdentityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityRegistry")
            .field("len", &self.len())
            .field("last", &self.last)
            .finish()
    }
}

/// [`SerializationId`] → already materialized node for one deserialization pass.
///
/// A dense slot table sized to the container's record count.
pub struct MaterializedRegistry {
    slots: Vec<Option<Rc<dyn Any>>>,
    filled: usize,
}

impl MaterializedRegistry {
    /// Registry for a container of `record_count` records.
    pub fn with_capacity(record_count: usize) -> Self {
        Self {
            slots: vec![None; record_count],
            filled: 0,
        }
    }

    /// Node already materialized for `id`.
    ///
    /// Returns `Ok(None)` for nil, for out-of-range ids and for ids not yet materialized.
    /// Fails with [`GraphError::TypeMismatch`] when the slot holds another node type.
    pub fn get<T: 'static>(&self, id: SerializationId) -> Result<Option<Node<T>>, GraphError> {
        let Some(erased) = id
            .index()
            .and_then(|index| self.slots.get(index))
            .and_then(Option::as_ref)
        else {
            return Ok(None);
        };
        Node::from_erased(Rc::clone(erased))
            .map(Some)
            .ok_or_else(|| GraphError::TypeMismatch {
                id,
                expected: type_name::<T>(),
                found: "a node of another type".into(),
            })
    }

    /// Record `node` as the instance for `id`.
    ///
    /// Returns `false` (and changes nothing) for nil, out-of-range or already filled ids.
    pub fn insert<T: 'static>(&mut self, id: SerializationId, node: &Node<T>) -> bool {
        let Some(slot) = id.index().and_then(|index| self.slots.get_mut(index)) else {
            return false;
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(node.erase());
        self.filled += 1;
        trace!(%id, node = type_name::<T>(), "materialized");
        true
    }

    /// Returns `true` once `id` has a node.
    pub fn contains(&self, id: SerializationId) -> bool {
        id.index()
            .and_then(|index| self.slots.get(index))
            .is_some_and(Option::is_some)
    }

    /// Number of ids materialized so far.
    pub fn materialized_count(&self) -> usize {
        self.filled
    }

    /// Number of slots (records in the container).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl std::fmt::Debug for MaterializedRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterializedRegistry")
            .field("capacity", &self.capacity())
            .field("filled", &self.filled)
            .finish()
    }
}
