// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared node-type fixtures and codec doubles for graphwire tests.
//!
//! Every node type here implements [`graphwire_core::GraphObject`] by hand, the way
//! generated glue would.
//!
//! # Modules
//!
//! - [`cards`] - Card-game nodes (abilities shared between a list and its cards)
//! - [`players`] - Two node types that point at each other
//! - [`peers`] - One node type with an optional self/peer reference
//! - [`mesh`] - Arbitrary directed graphs for property tests
//! - [`codecs`] - Counting and failing [`graphwire_core::RecordCodec`] doubles
#![forbid(unsafe_code)]

pub mod cards;
pub mod codecs;
pub mod mesh;
pub mod peers;
pub mod players;

pub use cards::{sample_card_list, Ability, Card, CardList};
pub use codecs::{CountingCodec, FailingCodec};
pub use mesh::{build_mesh, Vertex};
pub use peers::Peer;
pub use players::{Deck, Player};
