//! Board aggregate root: the card store plus connections and the latest
//! aggregate detection.
//!
//! # Invariants
//! - No two cards' derived rectangles overlap (shared edges are fine).
//! - Every card position lies inside the board extent.
//! - Every connection references two cards currently on the board.
//! - Aggregates only reference cards currently on the board and are never
//!   empty.

mod cluster;
mod flow;
mod guard;
mod placement;

use std::collections::HashMap;

use log::{debug, warn};
use uuid::Uuid;

use crate::config::BoardConfig;
use crate::error::{BoardError, BoardResult};
use crate::geometry::{Rect, bounds_of, estimate_card_size};
use crate::model::{
    Aggregate, BoardId, Card, CardId, CardType, Connection, Position, normalize_name,
};
use crate::routing::{self, Point};

pub use flow::{FlowIssue, FlowReport};

/// A routed connection ready to be drawn.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedConnection {
    pub source_id: CardId,
    pub target_id: CardId,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone)]
pub struct Board {
    id: BoardId,
    config: BoardConfig,
    cards: HashMap<CardId, Card>,
    // Insertion order; drives every iteration so results are reproducible.
    order: Vec<CardId>,
    aggregates: Vec<Aggregate>,
    connections: Vec<Connection>,
}

impl Board {
    pub fn new() -> Self {
        Self::with_config(BoardConfig::default())
    }

    pub fn with_config(config: BoardConfig) -> Self {
        Self::with_id(Uuid::new_v4(), config)
    }

    pub(crate) fn with_id(id: BoardId, config: BoardConfig) -> Self {
        Self {
            id,
            config,
            cards: HashMap::new(),
            order: Vec::new(),
            aggregates: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn id(&self) -> BoardId {
        self.id
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.get(&id)
    }

    /// Cards in insertion order.
    pub fn cards(&self) -> impl Iterator<Item = &Card> + '_ {
        self.order.iter().filter_map(|id| self.cards.get(id))
    }

    pub fn aggregates(&self) -> &[Aggregate] {
        &self.aggregates
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Looks a card up by exact (trimmed) name; `None` when absent or
    /// ambiguous.
    pub fn find_by_name(&self, name: &str) -> Option<&Card> {
        let name = name.trim();
        let mut matches = self.cards().filter(|card| card.name == name);
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(first)
    }

    /// Live rectangle of a card, recomputed from its current name.
    pub fn rect_of(&self, id: CardId) -> Option<Rect> {
        self.cards.get(&id).map(|card| self.card_rect(card))
    }

    pub(crate) fn card_rect(&self, card: &Card) -> Rect {
        self.rect_for(card.position, &card.name)
    }

    pub(crate) fn rect_for(&self, position: Position, name: &str) -> Rect {
        bounds_of(position, estimate_card_size(name, &self.config.metrics))
    }

    fn card_mut(&mut self, id: CardId) -> BoardResult<&mut Card> {
        self.cards
            .get_mut(&id)
            .ok_or_else(|| BoardError::NotFound(format!("card {id}")))
    }

    fn require_card(&self, id: CardId) -> BoardResult<&Card> {
        self.cards
            .get(&id)
            .ok_or_else(|| BoardError::NotFound(format!("card {id}")))
    }

    /// Adds a fully constructed card. Rejects duplicate ids and overlaps.
    pub fn add_card(&mut self, card: Card) -> BoardResult<CardId> {
        if self.cards.contains_key(&card.id) {
            return Err(BoardError::Conflict(format!("card {} already exists", card.id)));
        }
        if !card.position.within_extent() {
            return Err(BoardError::OutOfBounds {
                x: card.position.x,
                y: card.position.y,
            });
        }
        if self.has_conflict(card.position, &card.name, None) {
            warn!(
                "event=card_add module=board status=rejected reason=overlap x={} y={}",
                card.position.x, card.position.y
            );
            return Err(BoardError::Conflict(format!(
                "card `{}` would overlap another card at ({}, {})",
                card.name, card.position.x, card.position.y
            )));
        }
        let id = card.id;
        debug!(
            "event=card_add module=board status=ok card={} kind={} x={} y={}",
            id, card.kind, card.position.x, card.position.y
        );
        self.cards.insert(id, card);
        self.order.push(id);
        Ok(id)
    }

    /// Card factory plus [`Board::add_card`].
    pub fn create_card(
        &mut self,
        name: &str,
        kind: CardType,
        x: f32,
        y: f32,
        description: Option<String>,
    ) -> BoardResult<CardId> {
        let card = Card::new(name, kind, x, y, description)?;
        self.add_card(card)
    }

    /// Moves a card. Aggregate membership stays as is until the next
    /// detection.
    pub fn move_card(&mut self, id: CardId, x: f32, y: f32) -> BoardResult<()> {
        let name = self.require_card(id)?.name.clone();
        let position = Position { x, y };
        if !x.is_finite() || !y.is_finite() || !position.within_extent() {
            return Err(BoardError::OutOfBounds { x, y });
        }
        if self.has_conflict(position, &name, Some(id)) {
            warn!(
                "event=card_move module=board status=rejected reason=overlap card={id} x={x} y={y}"
            );
            return Err(BoardError::Conflict(format!(
                "card `{name}` would overlap another card at ({x}, {y})"
            )));
        }
        let card = self.card_mut(id)?;
        card.position = position;
        card.touch();
        debug!("event=card_move module=board status=ok card={id} x={x} y={y}");
        Ok(())
    }

    /// Removes a card, its aggregate memberships (dropping emptied
    /// aggregates) and every connection touching it.
    pub fn remove_card(&mut self, id: CardId) -> BoardResult<Card> {
        let card = self
            .cards
            .remove(&id)
            .ok_or_else(|| BoardError::NotFound(format!("card {id}")))?;
        self.order.retain(|existing| *existing != id);
        for aggregate in &mut self.aggregates {
            aggregate.members.retain(|member| *member != id);
        }
        self.aggregates.retain(|aggregate| !aggregate.is_empty());
        let before = self.connections.len();
        self.connections.retain(|connection| !connection.touches(id));
        debug!(
            "event=card_remove module=board status=ok card={} dropped_connections={}",
            id,
            before - self.connections.len()
        );
        Ok(card)
    }

    /// Renames a card. The new name changes the card's rectangle, so the
    /// overlap guard runs against the new size before anything is written.
    pub fn rename_card(&mut self, id: CardId, name: &str) -> BoardResult<()> {
        let position = self.require_card(id)?.position;
        let name = normalize_name(name)?;
        if self.has_conflict(position, &name, Some(id)) {
            warn!("event=card_rename module=board status=rejected reason=overlap card={id}");
            return Err(BoardError::Conflict(format!(
                "renamed card `{name}` would overlap another card"
            )));
        }
        let card = self.card_mut(id)?;
        card.name = name;
        card.touch();
        debug!("event=card_rename module=board status=ok card={id}");
        Ok(())
    }

    /// Changes the card type. Size depends on the name only, so no overlap
    /// check is needed.
    pub fn retype_card(&mut self, id: CardId, kind: CardType) -> BoardResult<()> {
        let card = self.card_mut(id)?;
        card.kind = kind;
        card.touch();
        debug!("event=card_retype module=board status=ok card={id} kind={kind}");
        Ok(())
    }

    pub fn describe_card(&mut self, id: CardId, description: Option<String>) -> BoardResult<()> {
        let card = self.card_mut(id)?;
        card.set_description(description);
        card.touch();
        debug!("event=card_describe module=board status=ok card={id}");
        Ok(())
    }

    pub fn add_connection(&mut self, source_id: CardId, target_id: CardId) -> BoardResult<()> {
        self.require_card(source_id)?;
        self.require_card(target_id)?;
        if source_id == target_id {
            return Err(BoardError::Validation(
                "a card cannot be connected to itself".to_string(),
            ));
        }
        let connection = Connection::new(source_id, target_id);
        if self.connections.contains(&connection) {
            return Err(BoardError::Conflict(format!(
                "connection {source_id} -> {target_id} already exists"
            )));
        }
        self.connections.push(connection);
        debug!("event=connection_add module=board status=ok source={source_id} target={target_id}");
        Ok(())
    }

    pub fn remove_connection(&mut self, source_id: CardId, target_id: CardId) -> BoardResult<()> {
        let connection = Connection::new(source_id, target_id);
        let before = self.connections.len();
        self.connections.retain(|existing| *existing != connection);
        if self.connections.len() == before {
            return Err(BoardError::NotFound(format!(
                "connection {source_id} -> {target_id}"
            )));
        }
        Ok(())
    }

    /// Routes an arrow between two cards, treating every other card as an
    /// obstacle.
    pub fn route_connection(&self, source_id: CardId, target_id: CardId) -> BoardResult<Vec<Point>> {
        let source = self.card_rect(self.require_card(source_id)?);
        let target = self.card_rect(self.require_card(target_id)?);
        let obstacles: Vec<Rect> = self
            .cards()
            .filter(|card| card.id != source_id && card.id != target_id)
            .map(|card| self.card_rect(card))
            .collect();
        Ok(routing::route(&source, &target, &obstacles, &self.config.routing))
    }

    /// Routes every connection in insertion order.
    pub fn route_all(&self) -> BoardResult<Vec<RoutedConnection>> {
        self.connections
            .iter()
            .map(|connection| {
                Ok(RoutedConnection {
                    source_id: connection.source_id,
                    target_id: connection.target_id,
                    points: self.route_connection(connection.source_id, connection.target_id)?,
                })
            })
            .collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
