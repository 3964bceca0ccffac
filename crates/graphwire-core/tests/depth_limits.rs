// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The default depth limit must fire before a 2 MiB thread stack runs out, on both sides.
#![allow(clippy::unwrap_used)]

use std::thread;

use graphwire_core::{
    CborCodec, Deserializer, EngineConfig, GraphError, Node, RecordCodec, SerializationId,
    Serializer, WireContainer,
};
use graphwire_dry_tests::peers::PeerRecord;
use graphwire_dry_tests::Peer;

/// Default stack size Rust gives spawned threads.
const WORKER_STACK: usize = 2 * 1024 * 1024;

fn on_worker_stack<F: FnOnce() + Send + 'static>(f: F) {
    thread::Builder::new()
        .stack_size(WORKER_STACK)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap();
}

fn chain(len: usize) -> Node<Peer> {
    let labels: Vec<String> = (0..len).map(|i| format!("p{i}")).collect();
    let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
    Peer::chain(&refs).unwrap()
}

/// `len` peer records where record `k` points at `k + 1` and the last one at nil.
fn chain_container(len: usize) -> WireContainer {
    let records = (0..len)
        .map(|k| {
            let other = if k + 1 < len {
                SerializationId::from_index(k + 1).unwrap()
            } else {
                SerializationId::NIL
            };
            CborCodec
                .encode_record(&PeerRecord {
                    label: format!("p{k}"),
                    other,
                })
                .unwrap()
        })
        .collect();
    WireContainer::new(records, None)
}

#[test]
fn chain_at_default_depth_round_trips_on_a_worker_stack() {
    on_worker_stack(|| {
        let depth = EngineConfig::DEFAULT_MAX_DEPTH;
        let mut session = Serializer::new(CborCodec);
        session.serialize(&chain(depth)).unwrap();
        let container = session.into_container(false).unwrap();
        assert_eq!(container.len(), depth);

        let mut session = Deserializer::new(container, CborCodec).unwrap();
        let mut cursor = Some(session.deserialize_root(Peer::default()).unwrap());
        let mut seen = 0;
        while let Some(node) = cursor {
            assert_eq!(node.borrow().label, format!("p{seen}"));
            seen += 1;
            cursor = Peer::other_of(&node);
        }
        assert_eq!(seen, depth);
    });
}

#[test]
fn serializing_one_past_default_depth_is_a_depth_error() {
    on_worker_stack(|| {
        let mut session = Serializer::new(CborCodec);
        let err = session
            .serialize(&chain(EngineConfig::DEFAULT_MAX_DEPTH + 1))
            .unwrap_err();
        assert!(
            matches!(err, GraphError::DepthLimit { limit } if limit == EngineConfig::DEFAULT_MAX_DEPTH),
            "{err:?}"
        );
    });
}

#[test]
fn deserializing_one_past_default_depth_is_a_depth_error() {
    on_worker_stack(|| {
        let container = chain_container(EngineConfig::DEFAULT_MAX_DEPTH + 1);
        let mut session = Deserializer::new(container, CborCodec).unwrap();
        let err = session.deserialize_root(Peer::default()).unwrap_err();
        assert!(
            matches!(err, GraphError::DepthLimit { limit } if limit == EngineConfig::DEFAULT_MAX_DEPTH),
            "{err:?}"
        );
    });
}

#[test]
fn hand_built_chain_at_default_depth_decodes() {
    on_worker_stack(|| {
        let container = chain_container(EngineConfig::DEFAULT_MAX_DEPTH);
        let mut session = Deserializer::new(container, CborCodec).unwrap();
        session.deserialize_root(Peer::default()).unwrap();
        assert_eq!(
            session.materialized_count(),
            EngineConfig::DEFAULT_MAX_DEPTH
        );
    });
}
