// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Card-game nodes: a list owns abilities and cards, cards reuse the list's abilities.

use graphwire_core::{
    Deserializer, GraphError, GraphObject, Node, RecordCodec, SerializationId, Serializer,
};
use serde::{Deserialize, Serialize};

/// A named ability with a movement archetype (`"Heal"` / `"Walker"`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ability {
    /// Ability name.
    pub name: String,
    /// Movement archetype.
    pub archetype: String,
}

impl Ability {
    /// Convenience constructor.
    pub fn new(name: &str, archetype: &str) -> Self {
        Self {
            name: name.to_owned(),
            archetype: archetype.to_owned(),
        }
    }
}

/// Wire record for [`Ability`].
#[derive(Debug, Serialize, Deserialize)]
pub struct AbilityRecord {
    /// Ability name.
    pub name: String,
    /// Movement archetype.
    pub archetype: String,
}

impl GraphObject for Ability {
    type Record = AbilityRecord;

    fn serialize<C: RecordCodec>(
        &self,
        _session: &mut Serializer<C>,
    ) -> Result<AbilityRecord, GraphError> {
        Ok(AbilityRecord {
            name: self.name.clone(),
            archetype: self.archetype.clone(),
        })
    }

    fn deserialize<C: RecordCodec>(
        &mut self,
        _session: &mut Deserializer<C>,
        record: AbilityRecord,
    ) -> Result<(), GraphError> {
        self.name = record.name;
        self.archetype = record.archetype;
        Ok(())
    }
}

/// A playable card referencing abilities.
#[derive(Debug, Default)]
pub struct Card {
    /// Card name.
    pub name: String,
    /// Mana cost.
    pub cost: u32,
    /// Abilities, typically shared with the owning [`CardList`].
    pub abilities: Vec<Node<Ability>>,
}

/// Wire record for [`Card`].
#[derive(Debug, Serialize, Deserialize)]
pub struct CardRecord {
    /// Card name.
    pub name: String,
    /// Mana cost.
    pub cost: u32,
    /// Ability ids.
    pub abilities: Vec<SerializationId>,
}

impl GraphObject for Card {
    type Record = CardRecord;

    fn serialize<C: RecordCodec>(
        &self,
        session: &mut Serializer<C>,
    ) -> Result<CardRecord, GraphError> {
        Ok(CardRecord {
            name: self.name.clone(),
            cost: self.cost,
            abilities: session.serialize_all(&self.abilities)?,
        })
    }

    fn deserialize<C: RecordCodec>(
        &mut self,
        session: &mut Deserializer<C>,
        record: CardRecord,
    ) -> Result<(), GraphError> {
        self.name = record.name;
        self.cost = record.cost;
        self.abilities = session.deserialize_all(&record.abilities)?;
        Ok(())
    }
}

/// Catalogue of abilities and the cards that use them.
#[derive(Debug, Default)]
pub struct CardList {
    /// Every ability in the catalogue.
    pub abilities: Vec<Node<Ability>>,
    /// Every card in the catalogue.
    pub cards: Vec<Node<Card>>,
}

/// Wire record for [`CardList`].
#[derive(Debug, Serialize, Deserialize)]
pub struct CardListRecord {
    /// Ability ids.
    pub abilities: Vec<SerializationId>,
    /// Card ids.
    pub cards: Vec<SerializationId>,
}

impl GraphObject for CardList {
    type Record = CardListRecord;

    fn serialize<C: RecordCodec>(
        &self,
        session: &mut Serializer<C>,
    ) -> Result<CardListRecord, GraphError> {
        Ok(CardListRecord {
            abilities: session.serialize_all(&self.abilities)?,
            cards: session.serialize_all(&self.cards)?,
        })
    }

    fn deserialize<C: RecordCodec>(
        &mut self,
        session: &mut Deserializer<C>,
        record: CardListRecord,
    ) -> Result<(), GraphError> {
        self.abilities = session.deserialize_all(&record.abilities)?;
        self.cards = session.deserialize_all(&record.cards)?;
        Ok(())
    }
}

/// `CardList { abilities: [Heal/Walker, Rage/Heavy], cards: [Poizom] }` where Poizom's only
/// ability is the *same* Heal/Walker node as `abilities[0]`.
pub fn sample_card_list() -> Node<CardList> {
    let heal = Node::new(Ability::new("Heal", "Walker"));
    let rage = Node::new(Ability::new("Rage", "Heavy"));
    let poizom = Node::new(Card {
        name: "Poizom".into(),
        cost: 3,
        abilities: vec![heal.clone()],
    });
    Node::new(CardList {
        abilities: vec![heal, rage],
        cards: vec![poizom],
    })
}
