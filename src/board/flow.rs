use log::info;
use serde::Serialize;

use crate::model::{Card, CardId, CardType};

use super::Board;

/// A command that is not immediately followed by a domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowIssue {
    pub command_id: CardId,
    /// Type of the card that follows the command, `None` at the end of the
    /// timeline.
    pub found: Option<CardType>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowReport {
    pub is_valid: bool,
    pub errors: Vec<FlowIssue>,
}

impl FlowReport {
    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|issue| issue.message.as_str()).collect()
    }
}

impl Board {
    /// Cards left to right; ties fall back to y, then insertion order.
    pub fn sorted_by_x(&self) -> Vec<&Card> {
        let mut cards: Vec<&Card> = self.cards().collect();
        cards.sort_by(|a, b| {
            a.position
                .x
                .total_cmp(&b.position.x)
                .then(a.position.y.total_cmp(&b.position.y))
        });
        cards
    }

    /// Every command must be directly followed, in x order, by a domain
    /// event. Read-only.
    pub fn validate_flow(&self) -> FlowReport {
        let timeline = self.sorted_by_x();
        let mut errors = Vec::new();
        for (idx, card) in timeline.iter().enumerate() {
            if card.kind != CardType::Command {
                continue;
            }
            match timeline.get(idx + 1) {
                None => errors.push(FlowIssue {
                    command_id: card.id,
                    found: None,
                    message: format!("Command '{}' must be followed by an event", card.name),
                }),
                Some(next) if next.kind != CardType::DomainEvent => errors.push(FlowIssue {
                    command_id: card.id,
                    found: Some(next.kind),
                    message: format!(
                        "Command '{}' must be followed by an event, found {} '{}'",
                        card.name, next.kind, next.name
                    ),
                }),
                Some(_) => {}
            }
        }
        info!(
            "event=flow_validate module=board cards={} errors={}",
            timeline.len(),
            errors.len()
        );
        FlowReport {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}
