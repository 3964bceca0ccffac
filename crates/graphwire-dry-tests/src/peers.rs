// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Single node type with an optional reference to another (or the same) peer.

use graphwire_core::{
    Deserializer, GraphError, GraphObject, Node, RecordCodec, SerializationId, Serializer,
};
use serde::{Deserialize, Serialize};

/// Labelled node with one optional outgoing reference.
#[derive(Debug, Default)]
pub struct Peer {
    /// Label.
    pub label: String,
    /// Optional reference, possibly to itself.
    pub other: Option<Node<Peer>>,
}

/// Wire record for [`Peer`].
#[derive(Debug, Serialize, Deserialize)]
pub struct PeerRecord {
    /// Label.
    pub label: String,
    /// Referenced id or nil.
    pub other: SerializationId,
}

impl GraphObject for Peer {
    type Record = PeerRecord;

    fn serialize<C: RecordCodec>(
        &self,
        session: &mut Serializer<C>,
    ) -> Result<PeerRecord, GraphError> {
        Ok(PeerRecord {
            label: self.label.clone(),
            other: session.serialize_opt(self.other.as_ref())?,
        })
    }

    fn deserialize<C: RecordCodec>(
        &mut self,
        session: &mut Deserializer<C>,
        record: PeerRecord,
    ) -> Result<(), GraphError> {
        self.label = record.label;
        self.other = session.deserialize(record.other)?;
        Ok(())
    }
}

impl Peer {
    /// Unlinked peer.
    pub fn lone(label: &str) -> Node<Self> {
        Node::new(Self {
            label: label.to_owned(),
            other: None,
        })
    }

    /// Peer whose `other` is itself.
    pub fn looped(label: &str) -> Node<Self> {
        let node = Self::lone(label);
        node.borrow_mut().other = Some(node.clone());
        node
    }

    /// Linear chain `labels[0] -> labels[1] -> ...`; returns the head.
    ///
    /// Returns `None` for an empty slice.
    pub fn chain(labels: &[&str]) -> Option<Node<Self>> {
        let mut head: Option<Node<Self>> = None;
        for label in labels.iter().rev() {
            let node = Self::lone(label);
            node.borrow_mut().other = head.take();
            head = Some(node);
        }
        head
    }

    /// The referenced peer, if any.
    pub fn other_of(node: &Node<Self>) -> Option<Node<Self>> {
        node.borrow().other.clone()
    }

    /// Clear `other` so a cycle through this node can be freed.
    pub fn unlink(node: &Node<Self>) {
        node.borrow_mut().other = None;
    }
}
