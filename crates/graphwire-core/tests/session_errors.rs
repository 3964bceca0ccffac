// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Failure paths of both sessions: root misuse, codec failures, malformed containers, limits.
#![allow(clippy::unwrap_used)]

use graphwire_core::{
    CborCodec, ContainerError, Deserializer, EngineConfig, GraphError, GraphObject, Node,
    RecordCodec, SerializationId, Serializer, WireContainer,
};
use graphwire_dry_tests::peers::PeerRecord;
use graphwire_dry_tests::players::{DeckRecord, PlayerRecord};
use graphwire_dry_tests::{sample_card_list, CardList, Deck, FailingCodec, Peer, Player};

fn peer_chain(labels: &[&str]) -> Node<Peer> {
    Peer::chain(labels).unwrap()
}

fn encode<R: serde::Serialize>(record: &R) -> Vec<u8> {
    CborCodec.encode_record(record).unwrap()
}

#[test]
fn second_top_level_call_is_rejected_and_first_graph_kept() {
    let mut session = Serializer::new(CborCodec);
    session.serialize(&peer_chain(&["a", "b"])).unwrap();
    let err = session.serialize(&Peer::lone("intruder")).unwrap_err();
    assert!(matches!(err, GraphError::RootAlreadySerialized));

    let container = session.into_container(false).unwrap();
    assert_eq!(container.len(), 2);
}

#[test]
fn encode_failure_yields_no_container() {
    let mut session = Serializer::new(FailingCodec::on_encode(1));
    session.serialize(&sample_card_list()).unwrap();
    let err = session.into_container(true).unwrap_err();
    match err {
        GraphError::Encode { id, type_name, .. } => {
            assert_eq!(id, SerializationId(1));
            assert!(type_name.ends_with("Ability"), "{type_name}");
        }
        other => unreachable!("expected Encode, got {other:?}"),
    }
}

#[test]
fn decode_failure_names_the_record() {
    let mut session = Serializer::new(CborCodec);
    session.serialize(&sample_card_list()).unwrap();
    let container = session.into_container(false).unwrap();

    let mut session = Deserializer::new(container, FailingCodec::on_decode(2)).unwrap();
    let err = session.deserialize_root(CardList::default()).unwrap_err();
    // Decode order: CardList, Heal, Rage.
    assert!(
        matches!(err, GraphError::Decode { id: SerializationId(2), .. }),
        "{err:?}"
    );
}

#[test]
fn empty_container_has_no_root() {
    let container = Serializer::new(CborCodec).into_container(false).unwrap();
    let mut session = Deserializer::new(container, CborCodec).unwrap();
    assert_eq!(session.record_count(), 0);
    let err = session.deserialize_root(Peer::default()).unwrap_err();
    assert!(matches!(err, GraphError::EmptyContainer));
}

#[test]
fn dangling_id_is_reported() {
    let record = PeerRecord {
        label: "dangling".into(),
        other: SerializationId(5),
    };
    let container = WireContainer::new(vec![encode(&record)], None);
    let mut session = Deserializer::new(container, CborCodec).unwrap();
    let err = session.deserialize_root(Peer::default()).unwrap_err();
    assert!(
        matches!(
            err,
            GraphError::UnknownId {
                id: SerializationId(5),
                count: 1
            }
        ),
        "{err:?}"
    );
}

#[test]
fn wrong_root_type_fails_to_decode() {
    let alice = Player::with_deck("alice", 1, "aggro");
    let mut session = Serializer::new(CborCodec);
    session.serialize(&alice).unwrap();
    Player::release(&alice);
    let container = session.into_container(false).unwrap();

    let mut session = Deserializer::new(container, CborCodec).unwrap();
    let err = session.deserialize_root(Deck::default()).unwrap_err();
    assert!(matches!(err, GraphError::Decode { id: SerializationId::ROOT, .. }), "{err:?}");
}

#[test]
fn type_name_check_catches_wrong_root_type_before_decoding() {
    let alice = Player::with_deck("alice", 1, "aggro");
    let mut session = Serializer::new(CborCodec);
    session.serialize(&alice).unwrap();
    Player::release(&alice);
    let container = session.into_container(true).unwrap();

    let config = EngineConfig::default().with_verify_type_names(true);
    let mut session = Deserializer::with_config(container, CborCodec, config).unwrap();
    match session.deserialize_root(Deck::default()).unwrap_err() {
        GraphError::TypeMismatch { id, expected, found } => {
            assert_eq!(id, SerializationId::ROOT);
            assert!(expected.ends_with("Deck"));
            assert!(found.ends_with("Player"));
        }
        other => unreachable!("expected TypeMismatch, got {other:?}"),
    }
}

#[test]
fn id_reused_at_a_different_type_is_a_mismatch() {
    // Player #0 -> Deck #1, but the deck claims #1 is its owner (a Player).
    let player = PlayerRecord {
        name: "p".into(),
        rating: 0,
        deck: SerializationId(1),
    };
    let deck = DeckRecord {
        title: "d".into(),
        owner: SerializationId(1),
    };
    let container = WireContainer::new(vec![encode(&player), encode(&deck)], None);
    let mut session = Deserializer::new(container, CborCodec).unwrap();
    let err = session.deserialize_root(Player::default()).unwrap_err();
    assert!(
        matches!(err, GraphError::TypeMismatch { id: SerializationId(1), .. }),
        "{err:?}"
    );
}

#[test]
fn deserializer_depth_limit_applies() {
    let mut session = Serializer::new(CborCodec);
    session.serialize(&peer_chain(&["a", "b", "c"])).unwrap();
    let container = session.into_container(false).unwrap();

    let config = EngineConfig::default().with_max_depth(2);
    let mut session = Deserializer::with_config(container.clone(), CborCodec, config).unwrap();
    let err = session.deserialize_root(Peer::default()).unwrap_err();
    assert!(matches!(err, GraphError::DepthLimit { limit: 2 }), "{err:?}");

    let config = EngineConfig::default().with_max_depth(3);
    let mut session = Deserializer::with_config(container, CborCodec, config).unwrap();
    let root = session.deserialize_root(Peer::default()).unwrap();
    let tail = Peer::other_of(&Peer::other_of(&root).unwrap()).unwrap();
    assert_eq!(tail.borrow().label, "c");
}

#[test]
fn record_limit_applies_to_serialization() {
    let config = EngineConfig::default().with_max_records(2);
    let mut session = Serializer::with_config(CborCodec, config);
    let err = session.serialize(&peer_chain(&["a", "b", "c"])).unwrap_err();
    assert!(matches!(err, GraphError::TooManyObjects { limit: 2 }), "{err:?}");
}

#[test]
fn container_is_validated_when_the_session_opens() {
    let mut future = WireContainer::new(Vec::new(), None);
    future.format_version = 9;
    let err = Deserializer::new(future, CborCodec).unwrap_err();
    assert!(matches!(
        err,
        GraphError::Container(ContainerError::FutureVersion {
            found: 9,
            supported: 1
        })
    ));

    let mismatched = WireContainer::new(vec![vec![0xf6]], Some(Vec::new()));
    let err = Deserializer::new(mismatched, CborCodec).unwrap_err();
    assert!(matches!(
        err,
        GraphError::Container(ContainerError::TypeNameCount {
            names: 0,
            records: 1
        })
    ));

    let config = EngineConfig::default().with_max_records(1);
    let crowded = WireContainer::new(vec![vec![0xf6], vec![0xf6]], None);
    let err = Deserializer::with_config(crowded, CborCodec, config).unwrap_err();
    assert!(matches!(
        err,
        GraphError::Container(ContainerError::TooManyRecords { count: 2, limit: 1 })
    ));
}

#[test]
fn malformed_envelopes_are_rejected() {
    // Truncated header.
    assert!(WireContainer::from_bytes(&[1, 0, 0]).is_err());
    // Version zero.
    assert_eq!(
        WireContainer::from_bytes(&[0, 0, 0, 0, 0, 0, 0, 0, 0]),
        Err(ContainerError::InvalidVersion)
    );
    // Count says one record but none follows.
    assert!(WireContainer::from_bytes(&[1, 0, 0, 0, 1, 0, 0, 0]).is_err());
    // Valid empty envelope followed by junk.
    assert_eq!(
        WireContainer::from_bytes(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0xaa]),
        Err(ContainerError::Trailing(1))
    );
    // Record count above the configured limit is refused before reading records.
    let config = EngineConfig::default().with_max_records(4);
    assert_eq!(
        WireContainer::from_bytes_with(&[1, 0, 0, 0, 5, 0, 0, 0], &config),
        Err(ContainerError::TooManyRecords { count: 5, limit: 4 })
    );
}

#[test]
fn failed_session_refuses_every_later_call() {
    // Root decodes, but the record it points at is garbage.
    let root = PeerRecord {
        label: "root".into(),
        other: SerializationId(1),
    };
    let container = WireContainer::new(vec![encode(&root), vec![0xff]], None);
    let mut session = Deserializer::new(container, CborCodec).unwrap();

    let err = session.deserialize_root(Peer::default()).unwrap_err();
    assert!(
        matches!(err, GraphError::Decode { id: SerializationId(1), .. }),
        "{err:?}"
    );
    assert!(session.is_failed());

    // The half-populated root is still registered; it must not come back as a success.
    assert!(matches!(
        session.deserialize_root(Peer::default()),
        Err(GraphError::SessionFailed)
    ));
    assert!(matches!(
        session.deserialize::<Peer>(SerializationId::ROOT),
        Err(GraphError::SessionFailed)
    ));
    assert!(matches!(
        session.deserialize::<Peer>(SerializationId::NIL),
        Err(GraphError::SessionFailed)
    ));
}

/// Node whose hook ignores a failure resolving its reference.
#[derive(Default)]
struct Forgiving {
    other: Option<Node<Forgiving>>,
}

impl GraphObject for Forgiving {
    type Record = PeerRecord;

    fn serialize<C: RecordCodec>(
        &self,
        session: &mut Serializer<C>,
    ) -> Result<PeerRecord, GraphError> {
        Ok(PeerRecord {
            label: String::new(),
            other: session.serialize_opt(self.other.as_ref())?,
        })
    }

    fn deserialize<C: RecordCodec>(
        &mut self,
        session: &mut Deserializer<C>,
        record: PeerRecord,
    ) -> Result<(), GraphError> {
        self.other = session.deserialize(record.other).unwrap_or(None);
        Ok(())
    }
}

#[test]
fn swallowed_nested_failure_still_fails_the_root() {
    let root = PeerRecord {
        label: "root".into(),
        other: SerializationId(1),
    };
    let container = WireContainer::new(vec![encode(&root), vec![0xff]], None);
    let mut session = Deserializer::new(container, CborCodec).unwrap();
    assert!(matches!(
        session.deserialize_root(Forgiving::default()),
        Err(GraphError::SessionFailed)
    ));
    assert!(session.is_failed());
}
