// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dense per-pass object identifiers.

use serde::{Deserialize, Serialize};

/// Handle into a [`WireContainer`](crate::WireContainer) record table.
///
/// Ids are assigned in first-encounter order during one serialization pass: id 0 is always
/// the root, id *k* is the *k*-th distinct node identity the traversal discovered. The
/// maximum `u32` value is reserved as [`SerializationId::NIL`] and means "no object".
///
/// Serializes as a bare integer so records can embed it directly.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializationId(pub u32);

impl SerializationId {
    /// Sentinel for an absent reference.
    pub const NIL: Self = Self(u32::MAX);

    /// Id of the root node of every non-empty container.
    pub const ROOT: Self = Self(0);

    /// Returns `true` for the nil sentinel.
    pub fn is_nil(self) -> bool {
        self == Self::NIL
    }

    /// Record index addressed by this id, or `None` for nil.
    pub fn index(self) -> Option<usize> {
        if self.is_nil() {
            None
        } else {
            usize::try_from(self.0).ok()
        }
    }

    /// Builds the id for record slot `index`.
    ///
    /// Returns `None` when the index does not fit below the sentinel.
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index)
            .ok()
            .filter(|raw| *raw != u32::MAX)
            .map(Self)
    }
}

impl std::fmt::Display for SerializationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_nil() {
            f.write_str("nil")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}
