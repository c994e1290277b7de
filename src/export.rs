use std::collections::HashMap;

use crate::board::Board;
use crate::model::{CardId, CardType};
use crate::theme::Palette;

fn class_name(kind: CardType) -> &'static str {
    match kind {
        CardType::DomainEvent => "domainEvent",
        CardType::Command => "command",
        CardType::Policy => "policy",
        CardType::Aggregate => "aggregate",
        CardType::ExternalSystem => "externalSystem",
        CardType::ReadModel => "readModel",
    }
}

fn node_shape(kind: CardType, label: &str) -> String {
    match kind {
        CardType::DomainEvent => format!("[\"{label}\"]"),
        CardType::Command => format!("(\"{label}\")"),
        CardType::Policy => format!("{{{{\"{label}\"}}}}"),
        CardType::Aggregate => format!("[[\"{label}\"]]"),
        CardType::ExternalSystem => format!("[/\"{label}\"/]"),
        CardType::ReadModel => format!("[(\"{label}\")]"),
    }
}

fn escape_label(text: &str) -> String {
    text.replace('"', "#quot;").replace('\n', "<br/>")
}

/// Emits the board as Mermaid flowchart text.
///
/// Nodes follow the left-to-right timeline, multi-card aggregates become
/// subgraphs, and every card type gets a `classDef` with its palette fill.
pub fn to_flowchart(board: &Board, palette: &Palette) -> String {
    let timeline = board.sorted_by_x();
    let node_ids: HashMap<CardId, String> = timeline
        .iter()
        .enumerate()
        .map(|(idx, card)| (card.id(), format!("c{}", idx + 1)))
        .collect();

    let mut grouped: HashMap<CardId, usize> = HashMap::new();
    for (idx, aggregate) in board.aggregates().iter().enumerate() {
        if aggregate.len() < 2 {
            continue;
        }
        for member in &aggregate.members {
            grouped.insert(*member, idx);
        }
    }

    let mut out = String::from("flowchart LR\n");
    for card in &timeline {
        if grouped.contains_key(&card.id()) {
            continue;
        }
        out.push_str(&format!(
            "  {}{}:::{}\n",
            node_ids[&card.id()],
            node_shape(card.kind(), &escape_label(card.name())),
            class_name(card.kind())
        ));
    }
    for (idx, aggregate) in board.aggregates().iter().enumerate() {
        if aggregate.len() < 2 {
            continue;
        }
        out.push_str(&format!(
            "  subgraph g{}[\"{}\"]\n",
            idx + 1,
            escape_label(&aggregate.name)
        ));
        for card in timeline.iter().filter(|card| aggregate.contains(card.id())) {
            out.push_str(&format!(
                "    {}{}:::{}\n",
                node_ids[&card.id()],
                node_shape(card.kind(), &escape_label(card.name())),
                class_name(card.kind())
            ));
        }
        out.push_str("  end\n");
    }
    for connection in board.connections() {
        let (Some(from), Some(to)) = (
            node_ids.get(&connection.source_id),
            node_ids.get(&connection.target_id),
        ) else {
            continue;
        };
        out.push_str(&format!("  {from} --> {to}\n"));
    }
    for kind in CardType::ALL {
        out.push_str(&format!(
            "  classDef {} fill:{},stroke:{},color:{}\n",
            class_name(kind),
            palette.fill_for(kind),
            palette.border_color,
            palette.text_color
        ));
    }
    out.push_str(&format!("  linkStyle default stroke:{}\n", palette.line_color));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_board_exports_header_and_classes() {
        let board = Board::new();
        let text = to_flowchart(&board, &Palette::default());
        assert!(text.starts_with("flowchart LR\n"));
        assert!(text.contains("classDef domainEvent fill:#FF9F43"));
        assert_eq!(text.lines().count(), 1 + CardType::ALL.len() + 1);
        assert!(text.ends_with("  linkStyle default stroke:#7A8AA6\n"));
    }

    #[test]
    fn nodes_follow_x_order_with_shapes() {
        let mut board = Board::new();
        let evt = board
            .create_card("Order \"Placed\"", CardType::DomainEvent, 400.0, 0.0, None)
            .unwrap();
        let cmd = board.create_card("Place Order", CardType::Command, 0.0, 0.0, None).unwrap();
        board.add_connection(cmd, evt).unwrap();
        let text = to_flowchart(&board, &Palette::default());
        assert!(text.contains("  c1(\"Place Order\"):::command\n"));
        assert!(text.contains("  c2[\"Order #quot;Placed#quot;\"]:::domainEvent\n"));
        assert!(text.contains("  c1 --> c2\n"));
    }

    #[test]
    fn clustered_cards_become_subgraphs() {
        let mut board = Board::new();
        board.create_card("Place Order", CardType::Command, 0.0, 0.0, None).unwrap();
        board.create_card("Order Placed", CardType::DomainEvent, 200.0, 0.0, None).unwrap();
        board.create_card("Inventory", CardType::ExternalSystem, 5000.0, 0.0, None).unwrap();
        board.detect_aggregates();
        let text = to_flowchart(&board, &Palette::default());
        assert!(text.contains("  subgraph g1[\"Aggregate 1\"]\n    c1(\"Place Order\"):::command\n"));
        assert!(text.contains("  c3[/\"Inventory\"/]:::externalSystem\n"));
        assert!(!text.contains("subgraph g2"));
    }
}
