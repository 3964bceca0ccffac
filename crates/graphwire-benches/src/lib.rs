// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared graph builders for the graphwire benches.
#![forbid(unsafe_code)]

use graphwire_core::Node;
use graphwire_dry_tests::{build_mesh, Vertex};

/// `n` vertices where the root fans out to every other vertex and each vertex `i > 0`
/// points back at the root and at vertex `i / 2`.
///
/// Every node is reachable from the root, the graph is full of cycles and shared
/// targets, and traversal depth stays at two regardless of `n`.
pub fn fan_mesh(n: usize) -> Vec<Node<Vertex>> {
    let mut edges = Vec::with_capacity(n.saturating_mul(3));
    for i in 1..n {
        edges.push((0, i));
        edges.push((i, 0));
        edges.push((i, i / 2));
    }
    build_mesh(n, &edges)
}
