use log::debug;

use crate::model::Position;

use super::Board;

impl Board {
    /// Finds a free spot for a card named `name` near `near`.
    ///
    /// Checks `near` first, then square rings of grid offsets
    /// (`placement.step` apart, up to `placement.max_rings` rings) in row
    /// order, skipping spots outside the board. Falls back to `near`
    /// unchanged when nothing is free; the caller's add will then report
    /// the conflict.
    pub fn find_free_position(&self, name: &str, near: Position) -> Position {
        if near.within_extent() && !self.has_conflict(near, name, None) {
            return near;
        }
        let step = self.config.placement.step;
        let rings = i64::from(self.config.placement.max_rings);
        for ring in 1..=rings {
            for dy in -ring..=ring {
                for dx in -ring..=ring {
                    if dx.abs() != ring && dy.abs() != ring {
                        continue;
                    }
                    let candidate = Position {
                        x: near.x + dx as f32 * step,
                        y: near.y + dy as f32 * step,
                    };
                    if candidate.within_extent() && !self.has_conflict(candidate, name, None) {
                        debug!(
                            "event=placement module=board ring={ring} x={} y={}",
                            candidate.x, candidate.y
                        );
                        return candidate;
                    }
                }
            }
        }
        near
    }
}
