//! Persisted board shape.
//!
//! Aggregates are derived and never written; a restored board starts with
//! none until detection runs again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::config::BoardConfig;
use crate::error::{BoardError, BoardResult};
use crate::model::{BoardId, Card, CardId, CardType, Connection, Position};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    pub id: CardId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CardType,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub version: u32,
    pub board_id: BoardId,
    pub cards: Vec<CardRecord>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl From<&Card> for CardRecord {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id(),
            name: card.name().to_string(),
            kind: card.kind(),
            position: card.position(),
            description: card.description().map(str::to_string),
            created_at: card.created_at(),
            last_modified: card.last_modified(),
        }
    }
}

impl Board {
    /// Card and connection data in insertion order.
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            version: SCHEMA_VERSION,
            board_id: self.id(),
            cards: self.cards().map(CardRecord::from).collect(),
            connections: self.connections().to_vec(),
        }
    }

    /// Rebuilds a board, re-checking every invariant on the way in.
    ///
    /// # Errors
    /// - `Validation` for an unknown schema version or a malformed record.
    /// - `Conflict` for duplicate ids, overlapping cards or duplicate
    ///   connections.
    /// - `NotFound` for a connection whose endpoint is not in the snapshot.
    pub fn from_snapshot(snapshot: BoardSnapshot, config: BoardConfig) -> BoardResult<Self> {
        if snapshot.version != SCHEMA_VERSION {
            return Err(BoardError::Validation(format!(
                "unsupported snapshot version {}, expected {SCHEMA_VERSION}",
                snapshot.version
            )));
        }
        let mut board = Board::with_id(snapshot.board_id, config);
        for record in snapshot.cards {
            let card = Card::restore(
                record.id,
                &record.name,
                record.kind,
                record.position.x,
                record.position.y,
                record.description,
                record.created_at,
                record.last_modified,
            )?;
            board.add_card(card)?;
        }
        for connection in snapshot.connections {
            board.add_connection(connection.source_id, connection.target_id)?;
        }
        log::info!(
            "event=snapshot_restore module=snapshot board={} cards={} connections={}",
            board.id(),
            board.len(),
            board.connections().len()
        );
        Ok(board)
    }
}
