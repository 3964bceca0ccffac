// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Arbitrary directed graphs (cycles, self-loops, parallel edges) over one node type.

use graphwire_core::{
    Deserializer, GraphError, GraphObject, Node, RecordCodec, SerializationId, Serializer,
};
use serde::{Deserialize, Serialize};

/// Graph vertex with an ordered list of outgoing edges.
#[derive(Debug, Default)]
pub struct Vertex {
    /// Caller-chosen tag; unique per vertex in [`build_mesh`].
    pub tag: u32,
    /// Outgoing edges in insertion order.
    pub edges: Vec<Node<Vertex>>,
}

/// Wire record for [`Vertex`].
#[derive(Debug, Serialize, Deserialize)]
pub struct VertexRecord {
    /// Tag.
    pub tag: u32,
    /// Edge target ids.
    pub edges: Vec<SerializationId>,
}

impl GraphObject for Vertex {
    type Record = VertexRecord;

    fn serialize<C: RecordCodec>(
        &self,
        session: &mut Serializer<C>,
    ) -> Result<VertexRecord, GraphError> {
        Ok(VertexRecord {
            tag: self.tag,
            edges: session.serialize_all(&self.edges)?,
        })
    }

    fn deserialize<C: RecordCodec>(
        &mut self,
        session: &mut Deserializer<C>,
        record: VertexRecord,
    ) -> Result<(), GraphError> {
        self.tag = record.tag;
        self.edges = session.deserialize_all(&record.edges)?;
        Ok(())
    }
}

/// Build `count` vertices tagged `0..count` and wire `edges` as `(from, to)` index pairs.
///
/// Pairs referring past `count` are ignored.
pub fn build_mesh(count: usize, edges: &[(usize, usize)]) -> Vec<Node<Vertex>> {
    let vertices: Vec<Node<Vertex>> = (0..count)
        .map(|i| {
            Node::new(Vertex {
                tag: u32::try_from(i).unwrap_or(u32::MAX),
                edges: Vec::new(),
            })
        })
        .collect();
    for &(from, to) in edges {
        if let (Some(src), Some(dst)) = (vertices.get(from), vertices.get(to)) {
            src.borrow_mut().edges.push(dst.clone());
        }
    }
    vertices
}

/// Clear every edge reachable from `roots` so cyclic meshes can be freed.
pub fn dismantle(roots: &[Node<Vertex>]) {
    let mut stack: Vec<Node<Vertex>> = roots.to_vec();
    while let Some(node) = stack.pop() {
        let edges = std::mem::take(&mut node.borrow_mut().edges);
        stack.extend(edges);
    }
}
