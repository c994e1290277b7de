//! Card sizing and axis-aligned rectangle tests.
//!
//! Sizes are a pure function of the name text and the metrics. Nothing here
//! caches, so a renamed card is always measured from its current name.

use serde::{Deserialize, Serialize};

use crate::config::CardMetrics;
use crate::model::Position;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    pub fn inflate(&self, margin: f32) -> Rect {
        Rect {
            left: self.left - margin,
            top: self.top - margin,
            right: self.right + margin,
            bottom: self.bottom + margin,
        }
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// Characters outside the single-byte range count double.
pub(crate) fn char_units(ch: char) -> u32 {
    if (ch as u32) < 0x100 { 1 } else { 2 }
}

fn line_units(line: &str) -> u32 {
    line.chars().map(char_units).sum()
}

fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(|line| line.trim_end_matches('\r'))
}

/// Estimates the rendered card size for `text`.
///
/// The widest logical line picks the width inside
/// `[min_width, max_width]`; each logical line then reflows into that width
/// and the line count drives the height.
pub fn estimate_card_size(text: &str, metrics: &CardMetrics) -> Size {
    let widest = split_lines(text).map(line_units).max().unwrap_or(0);
    let natural = widest as f32 * metrics.char_width + metrics.padding_x * 2.0;
    // `f32::clamp` panics when min_width > max_width.
    let width = natural.max(metrics.min_width).min(metrics.max_width);

    let available = (width - metrics.padding_x * 2.0).max(metrics.char_width);
    let line_count: u32 = split_lines(text)
        .map(|line| {
            let line_px = line_units(line) as f32 * metrics.char_width;
            ((line_px / available).ceil() as u32).max(1)
        })
        .sum();
    let content = line_count as f32 * metrics.line_height + metrics.padding_y * 2.0;

    Size {
        width,
        height: content.max(metrics.min_height),
    }
}

pub fn bounds_of(position: Position, size: Size) -> Rect {
    Rect {
        left: position.x,
        top: position.y,
        right: position.x + size.width,
        bottom: position.y + size.height,
    }
}

/// Separating-axis test. Rectangles that only share an edge do not
/// intersect.
pub fn intersects(a: &Rect, b: &Rect) -> bool {
    a.left < b.right && b.left < a.right && a.top < b.bottom && b.top < a.bottom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> CardMetrics {
        CardMetrics::default()
    }

    #[test]
    fn short_names_get_the_minimum_box() {
        let size = estimate_card_size("A", &metrics());
        assert_eq!(size, Size { width: 120.0, height: 80.0 });
    }

    #[test]
    fn width_grows_with_the_widest_line_then_clamps() {
        // 14 chars * 8 + 32 padding = 144
        let size = estimate_card_size("Order Accepted", &metrics());
        assert_eq!(size.width, 144.0);
        let long = estimate_card_size(&"x".repeat(80), &metrics());
        assert_eq!(long.width, 240.0);
    }

    #[test]
    fn wide_characters_count_double() {
        let ascii = estimate_card_size(&"a".repeat(12), &metrics());
        let wide = estimate_card_size(&"注".repeat(12), &metrics());
        assert_eq!(ascii.width, 128.0);
        assert_eq!(wide.width, 224.0);
    }

    #[test]
    fn long_lines_reflow_into_more_height() {
        // 80 chars = 640px into 208px of content -> 4 lines
        let size = estimate_card_size(&"x".repeat(80), &metrics());
        assert_eq!(size.height, 4.0 * 20.0 + 24.0);
    }

    #[test]
    fn explicit_newlines_each_take_a_line() {
        let size = estimate_card_size("a\nb\nc\nd", &metrics());
        assert_eq!(size.height, 4.0 * 20.0 + 24.0);
        let blank_lines = estimate_card_size("a\n\n\n\nb", &metrics());
        assert_eq!(blank_lines.height, 5.0 * 20.0 + 24.0);
    }

    #[test]
    fn inverted_width_band_settles_on_max_width() {
        let mut inverted = metrics();
        inverted.min_width = 300.0;
        let size = estimate_card_size("A", &inverted);
        assert_eq!(size.width, 240.0);
    }

    #[test]
    fn size_is_deterministic() {
        let a = estimate_card_size("Payment Captured", &metrics());
        let b = estimate_card_size("Payment Captured", &metrics());
        assert_eq!(a, b);
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect { left: 0.0, top: 0.0, right: 10.0, bottom: 10.0 };
        let b = Rect { left: 10.0, top: 0.0, right: 20.0, bottom: 10.0 };
        let c = Rect { left: 0.0, top: 10.0, right: 10.0, bottom: 20.0 };
        assert!(!intersects(&a, &b));
        assert!(!intersects(&a, &c));
        let d = Rect { left: 9.5, top: 9.5, right: 20.0, bottom: 20.0 };
        assert!(intersects(&a, &d));
        assert!(intersects(&d, &a));
    }

    #[test]
    fn contained_rect_intersects() {
        let outer = Rect { left: 0.0, top: 0.0, right: 100.0, bottom: 100.0 };
        let inner = Rect { left: 40.0, top: 40.0, right: 60.0, bottom: 60.0 };
        assert!(intersects(&outer, &inner));
    }

    #[test]
    fn bounds_use_position_as_top_left() {
        let rect = bounds_of(
            Position { x: 100.0, y: 200.0 },
            Size { width: 120.0, height: 80.0 },
        );
        assert_eq!(rect, Rect { left: 100.0, top: 200.0, right: 220.0, bottom: 280.0 });
        assert_eq!(rect.center(), (160.0, 240.0));
    }
}
