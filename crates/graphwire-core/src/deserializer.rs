// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph reconstruction from a [`WireContainer`].

use std::any::type_name;

use tracing::{debug, instrument, warn};

use crate::{
    CborCodec, EngineConfig, GraphError, GraphObject, MaterializedRegistry, Node, RecordCodec,
    SerializationId, WireContainer,
};

/// Single-use session that rebuilds one object graph from a [`WireContainer`].
///
/// Start with [`deserialize_root`](Deserializer::deserialize_root); each node's
/// [`GraphObject::deserialize`] hook resolves the ids embedded in its record through
/// [`deserialize`](Deserializer::deserialize) and friends. An id that already has a node
/// returns that same node, even while it is still being populated further up the stack.
pub struct Deserializer<C = CborCodec> {
    codec: C,
    config: EngineConfig,
    container: WireContainer,
    registry: MaterializedRegistry,
    depth: usize,
    failed: bool,
}

impl<C: RecordCodec> Deserializer<C> {
    /// Open a session over `container` with default limits.
    ///
    /// The container is validated up front (version, type-name table, limits).
    pub fn new(container: WireContainer, codec: C) -> Result<Self, GraphError> {
        Self::with_config(container, codec, EngineConfig::default())
    }

    /// Open a session with explicit limits.
    pub fn with_config(
        container: WireContainer,
        codec: C,
        config: EngineConfig,
    ) -> Result<Self, GraphError> {
        if let Err(err) = container.validate(&config) {
            warn!(%err, records = container.len(), "container failed validation");
            return Err(err.into());
        }
        let summary = container.summary();
        debug!(
            records = summary.record_count,
            bytes = summary.total_record_bytes,
            version = summary.format_version,
            codec = codec.name(),
            "deserializer opened"
        );
        let registry = MaterializedRegistry::with_capacity(container.len());
        Ok(Self {
            codec,
            config,
            container,
            registry,
            depth: 0,
            failed: false,
        })
    }

    /// Decode record 0 into `empty_root` and return the populated root.
    ///
    /// The caller supplies the root's concrete type by passing an empty instance of it.
    #[instrument(skip_all, fields(root = type_name::<T>()))]
    pub fn deserialize_root<T: GraphObject>(
        &mut self,
        empty_root: T,
    ) -> Result<Node<T>, GraphError> {
        if self.container.is_empty() {
            return Err(GraphError::EmptyContainer);
        }
        let root = self.materialize(SerializationId::ROOT, move || empty_root)?;
        debug!(
            materialized = self.registry.materialized_count(),
            records = self.container.len(),
            "root decoded"
        );
        root.ok_or(GraphError::EmptyContainer)
    }

    /// Resolve `id` to a node, constructing it with `T::default()` on first use.
    ///
    /// Nil yields `Ok(None)`.
    pub fn deserialize<T: GraphObject + Default>(
        &mut self,
        id: SerializationId,
    ) -> Result<Option<Node<T>>, GraphError> {
        self.materialize(id, T::default)
    }

    /// Resolve `id` to a node, constructing it with `construct` on first use.
    ///
    /// `construct` only runs when the id has not been materialized yet.
    pub fn deserialize_with<T, F>(
        &mut self,
        id: SerializationId,
        construct: F,
    ) -> Result<Option<Node<T>>, GraphError>
    where
        T: GraphObject,
        F: FnOnce() -> T,
    {
        self.materialize(id, construct)
    }

    /// Like [`deserialize`](Deserializer::deserialize) but a nil id is an error.
    pub fn deserialize_required<T: GraphObject + Default>(
        &mut self,
        id: SerializationId,
    ) -> Result<Node<T>, GraphError> {
        self.deserialize(id)?.ok_or(GraphError::NilReference {
            type_name: type_name::<T>(),
        })
    }

    /// Resolve every id in `ids`; nil entries are errors.
    pub fn deserialize_all<T: GraphObject + Default>(
        &mut self,
        ids: &[SerializationId],
    ) -> Result<Vec<Node<T>>, GraphError> {
        ids.iter()
            .map(|id| self.deserialize_required(*id))
            .collect()
    }

    /// Any failure poisons the session: nodes registered before their hooks ran may be half
    /// populated, and the registry would hand them out again.
    fn materialize<T, F>(
        &mut self,
        id: SerializationId,
        construct: F,
    ) -> Result<Option<Node<T>>, GraphError>
    where
        T: GraphObject,
        F: FnOnce() -> T,
    {
        if self.failed {
            return Err(GraphError::SessionFailed);
        }
        match self.materialize_node(id, construct) {
            Err(err) => {
                if !self.failed {
                    warn!(%id, %err, "deserializer session failed");
                }
                self.failed = true;
                Err(err)
            }
            // A hook swallowed a nested failure.
            Ok(_) if self.failed && self.depth == 0 => Err(GraphError::SessionFailed),
            ok => ok,
        }
    }

    fn materialize_node<T, F>(
        &mut self,
        id: SerializationId,
        construct: F,
    ) -> Result<Option<Node<T>>, GraphError>
    where
        T: GraphObject,
        F: FnOnce() -> T,
    {
        let Some(index) = id.index() else {
            return Ok(None);
        };
        if let Some(existing) = self.registry.get::<T>(id).map_err(|err| self.explain(err))? {
            return Ok(Some(existing));
        }
        let bytes = self
            .container
            .records
            .get(index)
            .ok_or(GraphError::UnknownId {
                id,
                count: self.container.len(),
            })?;
        if self.config.verify_type_names {
            self.check_type_name::<T>(id, index)?;
        }
        let record: T::Record =
            self.codec
                .decode_record(bytes)
                .map_err(|source| GraphError::Decode {
                    id,
                    type_name: type_name::<T>(),
                    source,
                })?;
        if self.depth >= self.config.max_depth {
            return Err(GraphError::DepthLimit {
                limit: self.config.max_depth,
            });
        }

        // Register before populating: a path back to `id` must get this same node.
        let node = Node::new(construct());
        self.registry.insert(id, &node);

        self.depth += 1;
        let populated = match node.try_borrow_mut() {
            Ok(mut value) => value.deserialize(self, record),
            Err(_) => Err(GraphError::NodeBorrowed { id }),
        };
        self.depth -= 1;
        populated?;
        Ok(Some(node))
    }

    fn check_type_name<T: GraphObject>(
        &self,
        id: SerializationId,
        index: usize,
    ) -> Result<(), GraphError> {
        match self.container.type_name(index) {
            Some(found) if found != type_name::<T>() => Err(GraphError::TypeMismatch {
                id,
                expected: type_name::<T>(),
                found: found.to_owned(),
            }),
            _ => Ok(()),
        }
    }

    /// Fill in the debug type name, when the container has one, on a registry mismatch.
    fn explain(&self, err: GraphError) -> GraphError {
        match err {
            GraphError::TypeMismatch { id, expected, found } => {
                let found = id
                    .index()
                    .and_then(|index| self.container.type_name(index))
                    .map_or(found, str::to_owned);
                GraphError::TypeMismatch {
                    id,
                    expected,
                    found,
                }
            }
            other => other,
        }
    }

    /// Number of records in the container.
    pub fn record_count(&self) -> usize {
        self.container.len()
    }

    /// Number of ids turned into nodes so far.
    pub fn materialized_count(&self) -> usize {
        self.registry.materialized_count()
    }

    /// Returns `true` once a call on this session has failed; every later call errors.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Debug type name of `id`, if the container carries them.
    pub fn type_name_of(&self, id: SerializationId) -> Option<&str> {
        id.index().and_then(|index| self.container.type_name(index))
    }
}

impl<C> std::fmt::Debug for Deserializer<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deserializer")
            .field("records", &self.container.len())
            .field("registry", &self.registry)
            .field("depth", &self.depth)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Serializer;
    use serde::{Deserialize, Serialize};

    #[derive(Default)]
    struct Leaf {
        weight: i64,
    }

    #[derive(Serialize, Deserialize)]
    struct LeafRecord {
        weight: i64,
    }

    impl GraphObject for Leaf {
        type Record = LeafRecord;

        fn serialize<C: RecordCodec>(
            &self,
            _session: &mut Serializer<C>,
        ) -> Result<LeafRecord, GraphError> {
            Ok(LeafRecord {
                weight: self.weight,
            })
        }

        fn deserialize<C: RecordCodec>(
            &mut self,
            _session: &mut Deserializer<C>,
            record: LeafRecord,
        ) -> Result<(), GraphError> {
            self.weight = record.weight;
            Ok(())
        }
    }

    fn leaf_container(weights: &[i64]) -> WireContainer {
        let records = weights
            .iter()
            .map(|w| CborCodec.encode_record(&LeafRecord { weight: *w }).unwrap())
            .collect();
        WireContainer::new(records, None)
    }

    #[test]
    fn nil_resolves_to_none_without_constructing() {
        let mut de = Deserializer::new(leaf_container(&[1]), CborCodec).unwrap();
        let mut built = false;
        let got = de
            .deserialize_with::<Leaf, _>(SerializationId::NIL, || {
                built = true;
                Leaf::default()
            })
            .unwrap();
        assert!(got.is_none());
        assert!(!built);
        assert_eq!(de.materialized_count(), 0);
    }

    #[test]
    fn repeated_ids_return_the_same_node() {
        let mut de = Deserializer::new(leaf_container(&[5, 6]), CborCodec).unwrap();
        let a = de.deserialize_required::<Leaf>(SerializationId(1)).unwrap();
        let b = de.deserialize_required::<Leaf>(SerializationId(1)).unwrap();
        assert!(Node::ptr_eq(&a, &b));
        assert_eq!(a.borrow().weight, 6);
        assert_eq!(de.materialized_count(), 1);
    }

    #[test]
    fn out_of_range_id_is_an_error_not_a_panic() {
        let mut de = Deserializer::new(leaf_container(&[1]), CborCodec).unwrap();
        let err = de.deserialize::<Leaf>(SerializationId(9)).unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnknownId {
                id: SerializationId(9),
                count: 1
            }
        ));
    }

    #[test]
    fn empty_container_has_no_root() {
        let mut de = Deserializer::new(WireContainer::new(Vec::new(), None), CborCodec).unwrap();
        assert!(matches!(
            de.deserialize_root(Leaf::default()),
            Err(GraphError::EmptyContainer)
        ));
    }

    #[test]
    fn nil_required_reference_is_reported() {
        let mut de = Deserializer::new(leaf_container(&[1]), CborCodec).unwrap();
        assert!(matches!(
            de.deserialize_required::<Leaf>(SerializationId::NIL),
            Err(GraphError::NilReference { .. })
        ));
    }

    #[test]
    fn corrupt_record_is_a_decode_error() {
        let container = WireContainer::new(vec![vec![0xff, 0x00]], None);
        let mut de = Deserializer::new(container, CborCodec).unwrap();
        let err = de.deserialize_root(Leaf::default()).unwrap_err();
        assert!(matches!(
            err,
            GraphError::Decode {
                id: SerializationId::ROOT,
                ..
            }
        ));
        assert_eq!(de.materialized_count(), 0);
    }

    #[test]
    fn invalid_container_is_rejected_on_open() {
        let mut container = leaf_container(&[1]);
        container.format_version = 0;
        assert!(matches!(
            Deserializer::new(container, CborCodec),
            Err(GraphError::Container(crate::ContainerError::InvalidVersion))
        ));
    }

    #[test]
    fn type_names_checked_only_on_request() {
        let mut container = leaf_container(&[3]);
        container.type_names = Some(vec!["some::Other".into()]);

        let mut lenient = Deserializer::new(container.clone(), CborCodec).unwrap();
        assert!(lenient.deserialize_root(Leaf::default()).is_ok());
        assert_eq!(
            lenient.type_name_of(SerializationId::ROOT),
            Some("some::Other")
        );

        let config = EngineConfig::default().with_verify_type_names(true);
        let mut strict = Deserializer::with_config(container, CborCodec, config).unwrap();
        let err = strict.deserialize_root(Leaf::default()).unwrap_err();
        assert!(matches!(err, GraphError::TypeMismatch { .. }));
    }
}
