use crate::geometry::intersects;
use crate::model::{CardId, Position};

use super::Board;

impl Board {
    /// Overlap guard: would a card named `name` at `position` intersect any
    /// card other than `exclude`?
    ///
    /// Every rectangle is rebuilt from the live name and position. Purely
    /// advisory; callers decide what to do with the answer.
    pub fn has_conflict(&self, position: Position, name: &str, exclude: Option<CardId>) -> bool {
        let candidate = self.rect_for(position, name);
        self.cards()
            .filter(|card| Some(card.id) != exclude)
            .any(|card| intersects(&candidate, &self.card_rect(card)))
    }
}
