use std::collections::VecDeque;

use log::{debug, info};

use crate::error::{BoardError, BoardResult};
use crate::model::{Aggregate, AggregateId, CardId, normalize_name};

use super::Board;

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

impl Board {
    /// Replaces the aggregate list with the connected components of the
    /// proximity graph: two cards are linked when their centers are at most
    /// the clustering radius apart.
    ///
    /// Components are discovered in card insertion order and named
    /// `Aggregate 1`, `Aggregate 2`, ...; manual names are discarded.
    pub fn detect_aggregates(&mut self) -> &[Aggregate] {
        let radius = self.config.cluster.radius;
        let centers: Vec<(CardId, (f32, f32))> = self
            .cards()
            .map(|card| (card.id, self.card_rect(card).center()))
            .collect();

        let mut visited = vec![false; centers.len()];
        let mut aggregates = Vec::new();
        let mut queue = VecDeque::new();
        for seed in 0..centers.len() {
            if visited[seed] {
                continue;
            }
            visited[seed] = true;
            queue.push_back(seed);
            let mut members = Vec::new();
            while let Some(idx) = queue.pop_front() {
                members.push(centers[idx].0);
                for (other, (_, center)) in centers.iter().enumerate() {
                    if !visited[other] && distance(centers[idx].1, *center) <= radius {
                        visited[other] = true;
                        queue.push_back(other);
                    }
                }
            }
            let name = format!("Aggregate {}", aggregates.len() + 1);
            aggregates.push(Aggregate::new(name, members));
        }

        info!(
            "event=aggregates_detect module=board cards={} aggregates={} radius={}",
            centers.len(),
            aggregates.len(),
            radius
        );
        self.aggregates = aggregates;
        &self.aggregates
    }

    pub fn clear_aggregates(&mut self) {
        self.aggregates.clear();
    }

    pub fn rename_aggregate(&mut self, id: AggregateId, name: &str) -> BoardResult<()> {
        let name = normalize_name(name)?;
        let aggregate = self
            .aggregates
            .iter_mut()
            .find(|aggregate| aggregate.id == id)
            .ok_or_else(|| BoardError::NotFound(format!("aggregate {id}")))?;
        aggregate.name = name;
        Ok(())
    }

    /// Mean center of the aggregate's current members.
    pub fn aggregate_centroid(&self, id: AggregateId) -> Option<(f32, f32)> {
        let aggregate = self.aggregates.iter().find(|aggregate| aggregate.id == id)?;
        let centers: Vec<(f32, f32)> = aggregate
            .members
            .iter()
            .filter_map(|member| self.rect_of(*member))
            .map(|rect| rect.center())
            .collect();
        if centers.is_empty() {
            return None;
        }
        let count = centers.len() as f32;
        let (sum_x, sum_y) = centers
            .iter()
            .fold((0.0, 0.0), |acc, center| (acc.0 + center.0, acc.1 + center.1));
        Some((sum_x / count, sum_y / count))
    }

    /// Adds a card to an aggregate by hand. The card must sit within the
    /// configured distance of the centroid as it is right now; it leaves
    /// any other aggregate it belonged to.
    pub fn add_to_aggregate(&mut self, aggregate_id: AggregateId, card_id: CardId) -> BoardResult<()> {
        let center = self
            .rect_of(card_id)
            .ok_or_else(|| BoardError::NotFound(format!("card {card_id}")))?
            .center();
        let aggregate = self
            .aggregates
            .iter()
            .find(|aggregate| aggregate.id == aggregate_id)
            .ok_or_else(|| BoardError::NotFound(format!("aggregate {aggregate_id}")))?;
        if aggregate.contains(card_id) {
            return Err(BoardError::Conflict(format!(
                "card {card_id} already belongs to `{}`",
                aggregate.name
            )));
        }
        if let Some(centroid) = self.aggregate_centroid(aggregate_id) {
            let limit = self.config.cluster.max_member_distance;
            let gap = distance(center, centroid);
            if gap > limit {
                return Err(BoardError::Validation(format!(
                    "card {card_id} is {gap:.0} away from the aggregate centroid, at most {limit:.0} allowed"
                )));
            }
        }

        for aggregate in &mut self.aggregates {
            if aggregate.id == aggregate_id {
                aggregate.members.push(card_id);
            } else {
                aggregate.members.retain(|member| *member != card_id);
            }
        }
        self.aggregates.retain(|aggregate| !aggregate.is_empty());
        debug!("event=aggregate_add_member module=board aggregate={aggregate_id} card={card_id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use uuid::Uuid;

    use crate::board::Board;
    use crate::error::BoardError;
    use crate::model::{CardId, CardType};

    fn partition(board: &Board) -> BTreeSet<BTreeSet<CardId>> {
        board
            .aggregates()
            .iter()
            .map(|aggregate| aggregate.members.iter().copied().collect())
            .collect()
    }

    #[test]
    fn chain_links_transitively_through_the_queue() {
        let mut board = Board::new();
        // Neighbours 250 apart; ends 500 apart, beyond the 300 radius.
        let a = board.create_card("A", CardType::Command, 0.0, 0.0, None).unwrap();
        let b = board.create_card("B", CardType::DomainEvent, 250.0, 0.0, None).unwrap();
        let c = board.create_card("C", CardType::Policy, 500.0, 0.0, None).unwrap();
        let far = board.create_card("D", CardType::ReadModel, 3000.0, 3000.0, None).unwrap();

        let aggregates = board.detect_aggregates();
        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].name, "Aggregate 1");
        assert_eq!(aggregates[0].members, vec![a, b, c]);
        assert_eq!(aggregates[1].name, "Aggregate 2");
        assert_eq!(aggregates[1].members, vec![far]);
    }

    #[test]
    fn detection_is_idempotent_and_replaces_manual_names() {
        let mut board = Board::new();
        board.create_card("A", CardType::Command, 0.0, 0.0, None).unwrap();
        board.create_card("B", CardType::DomainEvent, 200.0, 100.0, None).unwrap();
        board.create_card("C", CardType::Policy, 2000.0, 0.0, None).unwrap();
        board.detect_aggregates();
        let first = partition(&board);
        let id = board.aggregates()[0].id;
        board.rename_aggregate(id, "Order").unwrap();
        assert_eq!(board.aggregates()[0].name, "Order");

        board.detect_aggregates();
        assert_eq!(partition(&board), first);
        assert_eq!(board.aggregates()[0].name, "Aggregate 1");
    }

    #[test]
    fn empty_board_has_no_aggregates() {
        let mut board = Board::new();
        assert!(board.detect_aggregates().is_empty());
    }

    #[test]
    fn manual_membership_is_gated_by_the_centroid() {
        let mut board = Board::new();
        let a = board.create_card("A", CardType::Command, 0.0, 0.0, None).unwrap();
        let near = board.create_card("B", CardType::DomainEvent, 1000.0, 0.0, None).unwrap();
        let far = board.create_card("C", CardType::DomainEvent, 4000.0, 0.0, None).unwrap();
        board.detect_aggregates();
        let first = board.aggregates()[0].id;
        assert_eq!(board.aggregates().len(), 3);

        // 1000 away from a single-member centroid; limit is 400.
        assert!(matches!(
            board.add_to_aggregate(first, near),
            Err(BoardError::Validation(_))
        ));

        board.move_card(near, 300.0, 0.0).unwrap();
        board.add_to_aggregate(first, near).unwrap();
        // B's own singleton aggregate is now empty and discarded.
        assert_eq!(board.aggregates().len(), 2);
        assert_eq!(board.aggregates()[0].members, vec![a, near]);
        assert_eq!(board.aggregate_centroid(first), Some((210.0, 40.0)));

        assert!(matches!(
            board.add_to_aggregate(first, near),
            Err(BoardError::Conflict(_))
        ));
        assert!(matches!(
            board.add_to_aggregate(first, far),
            Err(BoardError::Validation(_))
        ));
        assert!(matches!(
            board.add_to_aggregate(Uuid::new_v4(), a),
            Err(BoardError::NotFound(_))
        ));
    }

    #[test]
    fn clear_drops_every_aggregate() {
        let mut board = Board::new();
        board.create_card("A", CardType::Command, 0.0, 0.0, None).unwrap();
        board.detect_aggregates();
        board.clear_aggregates();
        assert!(board.aggregates().is_empty());
    }
}
