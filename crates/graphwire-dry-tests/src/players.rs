// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Two node types forming a 2-cycle: a player holds a deck, the deck names its owner.

use graphwire_core::{
    Deserializer, GraphError, GraphObject, Node, RecordCodec, SerializationId, Serializer,
};
use serde::{Deserialize, Serialize};

/// A player and their current deck.
#[derive(Debug, Default)]
pub struct Player {
    /// Display name.
    pub name: String,
    /// Rating points.
    pub rating: i32,
    /// Current deck, if any.
    pub deck: Option<Node<Deck>>,
}

/// A deck and the player who owns it.
#[derive(Debug, Default)]
pub struct Deck {
    /// Deck title.
    pub title: String,
    /// Owning player, if any.
    pub owner: Option<Node<Player>>,
}

/// Wire record for [`Player`].
#[derive(Debug, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Display name.
    pub name: String,
    /// Rating points.
    pub rating: i32,
    /// Deck id or nil.
    pub deck: SerializationId,
}

/// Wire record for [`Deck`].
#[derive(Debug, Serialize, Deserialize)]
pub struct DeckRecord {
    /// Deck title.
    pub title: String,
    /// Owner id or nil.
    pub owner: SerializationId,
}

impl GraphObject for Player {
    type Record = PlayerRecord;

    fn serialize<C: RecordCodec>(
        &self,
        session: &mut Serializer<C>,
    ) -> Result<PlayerRecord, GraphError> {
        Ok(PlayerRecord {
            name: self.name.clone(),
            rating: self.rating,
            deck: session.serialize_opt(self.deck.as_ref())?,
        })
    }

    fn deserialize<C: RecordCodec>(
        &mut self,
        session: &mut Deserializer<C>,
        record: PlayerRecord,
    ) -> Result<(), GraphError> {
        self.name = record.name;
        self.rating = record.rating;
        self.deck = session.deserialize(record.deck)?;
        Ok(())
    }
}

impl GraphObject for Deck {
    type Record = DeckRecord;

    fn serialize<C: RecordCodec>(
        &self,
        session: &mut Serializer<C>,
    ) -> Result<DeckRecord, GraphError> {
        Ok(DeckRecord {
            title: self.title.clone(),
            owner: session.serialize_opt(self.owner.as_ref())?,
        })
    }

    fn deserialize<C: RecordCodec>(
        &mut self,
        session: &mut Deserializer<C>,
        record: DeckRecord,
    ) -> Result<(), GraphError> {
        self.title = record.title;
        self.owner = session.deserialize(record.owner)?;
        Ok(())
    }
}

impl Player {
    /// A player owning a fresh deck that points back at them.
    pub fn with_deck(name: &str, rating: i32, title: &str) -> Node<Self> {
        let player = Node::new(Self {
            name: name.to_owned(),
            rating,
            deck: None,
        });
        let deck = Node::new(Deck {
            title: title.to_owned(),
            owner: Some(player.clone()),
        });
        player.borrow_mut().deck = Some(deck);
        player
    }

    /// Drop the player → deck edge so the pair can be freed.
    pub fn release(player: &Node<Self>) {
        let deck = player.borrow_mut().deck.take();
        if let Some(deck) = deck {
            deck.borrow_mut().owner = None;
        }
    }
}
