//! Board domain records: cards, connections and derived aggregates.
//!
//! # Invariants
//! - A card name is 1..=200 printable characters after trimming.
//! - Positions are finite and lie inside `0..=BOARD_EXTENT` on both axes.
//! - Aggregates reference cards by id and never own them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BoardError, BoardResult};

/// Upper bound of the board on both axes. The lower bound is zero.
pub const BOARD_EXTENT: f32 = 10_000.0;
pub const MAX_NAME_CHARS: usize = 200;

// Line breaks are allowed in names. Other control, format, private-use,
// unassigned and line/paragraph separator characters are not.
static INVISIBLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{Cc}\p{Cf}\p{Co}\p{Cn}\p{Zl}\p{Zp}&&[^\n]]").unwrap()
});

pub type CardId = Uuid;
pub type AggregateId = Uuid;
pub type BoardId = Uuid;

/// Closed set of sticky-note kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardType {
    DomainEvent,
    Command,
    Policy,
    /// Marker note naming an aggregate on the wall; unrelated to detected
    /// [`Aggregate`] groups.
    Aggregate,
    ExternalSystem,
    ReadModel,
}

impl CardType {
    pub const ALL: [CardType; 6] = [
        CardType::DomainEvent,
        CardType::Command,
        CardType::Policy,
        CardType::Aggregate,
        CardType::ExternalSystem,
        CardType::ReadModel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CardType::DomainEvent => "domain-event",
            CardType::Command => "command",
            CardType::Policy => "policy",
            CardType::Aggregate => "aggregate",
            CardType::ExternalSystem => "external-system",
            CardType::ReadModel => "read-model",
        }
    }

    /// Display fill color of the sticky note.
    pub fn color(self) -> &'static str {
        match self {
            CardType::DomainEvent => "#FF9F43",
            CardType::Command => "#54A0FF",
            CardType::Policy => "#C8A2E8",
            CardType::Aggregate => "#FECA57",
            CardType::ExternalSystem => "#FF6B9D",
            CardType::ReadModel => "#1DD1A1",
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardType {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "domain-event" | "event" => Ok(CardType::DomainEvent),
            "command" => Ok(CardType::Command),
            "policy" => Ok(CardType::Policy),
            "aggregate" => Ok(CardType::Aggregate),
            "external-system" | "external" => Ok(CardType::ExternalSystem),
            "read-model" => Ok(CardType::ReadModel),
            other => Err(BoardError::Validation(format!("unknown card type `{other}`"))),
        }
    }
}

/// Trims `raw` and checks it against the card name rule.
pub fn normalize_name(raw: &str) -> BoardResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(BoardError::Validation("card name must not be empty".to_string()));
    }
    let len = name.chars().count();
    if len > MAX_NAME_CHARS {
        return Err(BoardError::Validation(format!(
            "card name has {len} characters, at most {MAX_NAME_CHARS} allowed"
        )));
    }
    if INVISIBLE_RE.is_match(name) {
        return Err(BoardError::Validation(
            "card name contains non-printable characters".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn normalize_description(raw: Option<String>) -> Option<String> {
    raw.map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// Validated constructor. Negative or non-finite coordinates are
    /// malformed input; coordinates past the extent are out of bounds.
    pub fn new(x: f32, y: f32) -> BoardResult<Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(BoardError::Validation(format!(
                "coordinates must be finite, got ({x}, {y})"
            )));
        }
        if x < 0.0 || y < 0.0 {
            return Err(BoardError::Validation(format!(
                "coordinates must not be negative, got ({x}, {y})"
            )));
        }
        let position = Self { x, y };
        if !position.within_extent() {
            return Err(BoardError::OutOfBounds { x, y });
        }
        Ok(position)
    }

    pub fn within_extent(&self) -> bool {
        (0.0..=BOARD_EXTENT).contains(&self.x) && (0.0..=BOARD_EXTENT).contains(&self.y)
    }
}

/// A positioned, typed, named sticky note.
///
/// Fields are read-only from outside the crate; every mutation goes
/// through [`crate::board::Board`] so the overlap and bounds invariants
/// hold and `last_modified` is refreshed.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub(crate) id: CardId,
    pub(crate) name: String,
    pub(crate) kind: CardType,
    pub(crate) position: Position,
    pub(crate) description: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) last_modified: DateTime<Utc>,
}

impl Card {
    /// Creates a card with a fresh id and both timestamps set to now.
    pub fn new(
        name: &str,
        kind: CardType,
        x: f32,
        y: f32,
        description: Option<String>,
    ) -> BoardResult<Self> {
        let now = Utc::now();
        Self::restore(Uuid::new_v4(), name, kind, x, y, description, now, now)
    }

    /// Rebuilds a card with a caller-provided identity and timestamps.
    ///
    /// Used by snapshot restore, where identity already exists externally.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: CardId,
        name: &str,
        kind: CardType,
        x: f32,
        y: f32,
        description: Option<String>,
        created_at: DateTime<Utc>,
        last_modified: DateTime<Utc>,
    ) -> BoardResult<Self> {
        if id.is_nil() {
            return Err(BoardError::Validation("card id must not be nil".to_string()));
        }
        if last_modified < created_at {
            return Err(BoardError::Validation(format!(
                "card {id} was modified before it was created"
            )));
        }
        Ok(Self {
            id,
            name: normalize_name(name)?,
            kind,
            position: Position::new(x, y)?,
            description: normalize_description(description),
            created_at,
            last_modified,
        })
    }

    pub fn id(&self) -> CardId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CardType {
        self.kind
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    pub(crate) fn set_description(&mut self, description: Option<String>) {
        self.description = normalize_description(description);
    }

    // Keeps `last_modified` monotonic even if the wall clock steps back.
    pub(crate) fn touch(&mut self) {
        self.last_modified = Utc::now().max(self.last_modified);
    }
}

/// Directed reference between two cards, drawn as a routed arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source_id: CardId,
    pub target_id: CardId,
}

impl Connection {
    pub fn new(source_id: CardId, target_id: CardId) -> Self {
        Self {
            source_id,
            target_id,
        }
    }

    pub fn touches(&self, card: CardId) -> bool {
        self.source_id == card || self.target_id == card
    }
}

/// Derived group of spatially clustered cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub id: AggregateId,
    pub name: String,
    pub members: Vec<CardId>,
}

impl Aggregate {
    pub fn new(name: impl Into<String>, members: Vec<CardId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            members,
        }
    }

    pub fn contains(&self, card: CardId) -> bool {
        self.members.contains(&card)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
