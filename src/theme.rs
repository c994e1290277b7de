use serde::{Deserialize, Serialize};

use crate::model::CardType;

/// Sticky-note colors per card type plus the ink used for text and arrows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub domain_event: String,
    pub command: String,
    pub policy: String,
    pub aggregate: String,
    pub external_system: String,
    pub read_model: String,
    pub text_color: String,
    pub border_color: String,
    pub line_color: String,
}

impl Palette {
    /// The classic event storming wall: orange events, blue commands,
    /// lilac policies, yellow aggregates, pink external systems and green
    /// read models.
    pub fn event_storming() -> Self {
        Self {
            domain_event: CardType::DomainEvent.color().to_string(),
            command: CardType::Command.color().to_string(),
            policy: CardType::Policy.color().to_string(),
            aggregate: CardType::Aggregate.color().to_string(),
            external_system: CardType::ExternalSystem.color().to_string(),
            read_model: CardType::ReadModel.color().to_string(),
            text_color: "#1C2430".to_string(),
            border_color: "#57606F".to_string(),
            line_color: "#7A8AA6".to_string(),
        }
    }

    pub fn fill_for(&self, kind: CardType) -> &str {
        match kind {
            CardType::DomainEvent => &self.domain_event,
            CardType::Command => &self.command,
            CardType::Policy => &self.policy,
            CardType::Aggregate => &self.aggregate,
            CardType::ExternalSystem => &self.external_system,
            CardType::ReadModel => &self.read_model,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::event_storming()
    }
}
