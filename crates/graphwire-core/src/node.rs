// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared node handles and the per-type serialization contract.

use std::any::Any;
use std::cell::{BorrowError, BorrowMutError, Ref, RefCell, RefMut};
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Deserializer, GraphError, RecordCodec, Serializer};

/// Address-based identity of a [`Node`] allocation.
///
/// Two handles have the same identity exactly when they point at the same node. Field values
/// never participate. An identity is only meaningful while some handle to the node is alive;
/// the [`IdentityRegistry`](crate::IdentityRegistry) keeps one for the whole pass.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeIdentity(usize);

/// Shared, interiorly mutable handle to one graph node.
///
/// Cloning a `Node` clones the handle, not the node. Graph edges are `Node` (or
/// `Option<Node>`) fields on the node types themselves, so cycles are reference cycles.
///
/// # Leaks
///
/// A cyclic graph is never freed on its own, and that includes every graph a
/// [`Deserializer`] rebuilds from a cyclic container. Break the cycles before dropping the last
/// outside handle, for example with [`Node::take`] on each node that closes one.
pub struct Node<T>(Rc<RefCell<T>>);

impl<T> Node<T> {
    /// Wrap `value` in a new node with its own identity.
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Identity of the node this handle points at.
    pub fn identity(&self) -> NodeIdentity {
        NodeIdentity(Rc::as_ptr(&self.0).cast::<()>() as usize)
    }

    /// Returns `true` when both handles point at the same node.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Immutably borrow the node.
    ///
    /// # Panics
    ///
    /// Panics if the node is currently mutably borrowed. During deserialization that is the
    /// case for every node whose hook is still running further up the stack.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    /// Mutably borrow the node.
    ///
    /// # Panics
    ///
    /// Panics if the node is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Non-panicking variant of [`Node::borrow`].
    pub fn try_borrow(&self) -> Result<Ref<'_, T>, BorrowError> {
        self.0.try_borrow()
    }

    /// Non-panicking variant of [`Node::borrow_mut`].
    pub fn try_borrow_mut(&self) -> Result<RefMut<'_, T>, BorrowMutError> {
        self.0.try_borrow_mut()
    }

    /// Number of live handles to this node.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl<T: Default> Node<T> {
    /// Replace the node's value with `T::default()` and return the old value.
    ///
    /// Dropping the returned value drops the node's outgoing edges, which breaks any cycle
    /// through this node. Other handles keep pointing at the (now default) node.
    ///
    /// # Panics
    ///
    /// Panics if the node is currently borrowed.
    pub fn take(&self) -> T {
        self.0.take()
    }
}

impl<T: 'static> Node<T> {
    /// Type-erased handle used by the registries.
    pub(crate) fn erase(&self) -> Rc<dyn Any> {
        let rc: Rc<dyn Any> = self.0.clone();
        rc
    }

    /// Recover a typed handle from a registry entry.
    pub(crate) fn from_erased(erased: Rc<dyn Any>) -> Option<Self> {
        erased.downcast::<RefCell<T>>().ok().map(Self)
    }
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

// Only the identity: a cyclic graph would otherwise recurse forever.
impl<T> std::fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Node")
            .field(&format_args!("{:#x}", self.identity().0))
            .finish()
    }
}

/// Per-type serialization contract for graph nodes.
///
/// The engine never inspects a node's fields. Each node type turns its own scalar data into a
/// [`Record`](GraphObject::Record), replacing every node reference with the
/// [`SerializationId`](crate::SerializationId) the session hands back, and reverses the process
/// on the way in. Hand-written or generated glue implements this trait; the engine supplies
/// traversal, identity tracking and the container.
pub trait GraphObject: 'static {
    /// Flat record carrying this node's scalars and the ids of the nodes it references.
    type Record: Serialize + DeserializeOwned + 'static;

    /// Build this node's record.
    ///
    /// Call [`Serializer::serialize`] (or `serialize_opt` / `serialize_all`) for every
    /// referenced node and embed the returned ids.
    fn serialize<C: RecordCodec>(
        &self,
        session: &mut Serializer<C>,
    ) -> Result<Self::Record, GraphError>;

    /// Populate a freshly constructed node from its record.
    ///
    /// Call [`Deserializer::deserialize`] (or one of its variants) for every embedded id. A
    /// returned node may still be populating further up the stack; store the handle but do not
    /// borrow it here.
    fn deserialize<C: RecordCodec>(
        &mut self,
        session: &mut Deserializer<C>,
        record: Self::Record,
    ) -> Result<(), GraphError>;
}
