use crate::config::RoutingConfig;
use crate::geometry::Rect;

pub type Point = (f32, f32);

const EPS: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeSide {
    Left,
    Right,
    Top,
    Bottom,
}

/// Picks the facing sides of two cards: the axis with the longer
/// center-to-center offset wins, ties go horizontal.
pub fn facing_sides(from: &Rect, to: &Rect) -> (EdgeSide, EdgeSide) {
    let (from_cx, from_cy) = from.center();
    let (to_cx, to_cy) = to.center();
    let dx = to_cx - from_cx;
    let dy = to_cy - from_cy;
    if dx.abs() >= dy.abs() {
        if dx >= 0.0 {
            (EdgeSide::Right, EdgeSide::Left)
        } else {
            (EdgeSide::Left, EdgeSide::Right)
        }
    } else if dy >= 0.0 {
        (EdgeSide::Bottom, EdgeSide::Top)
    } else {
        (EdgeSide::Top, EdgeSide::Bottom)
    }
}

/// Midpoint of the given side.
pub fn anchor_point(rect: &Rect, side: EdgeSide) -> Point {
    let (cx, cy) = rect.center();
    match side {
        EdgeSide::Left => (rect.left, cy),
        EdgeSide::Right => (rect.right, cy),
        EdgeSide::Top => (cx, rect.top),
        EdgeSide::Bottom => (cx, rect.bottom),
    }
}

/// Fixed candidate set between two exit points: both L shapes, then the
/// four Z detours around the combined box of both cards.
fn route_candidates(
    source: &Rect,
    target: &Rect,
    start: Point,
    end: Point,
    margin: f32,
) -> Vec<Vec<Point>> {
    let outer = source.union(target).inflate(margin);
    vec![
        vec![start, (end.0, start.1), end],
        vec![start, (start.0, end.1), end],
        vec![start, (start.0, outer.top), (end.0, outer.top), end],
        vec![start, (start.0, outer.bottom), (end.0, outer.bottom), end],
        vec![start, (outer.left, start.1), (outer.left, end.1), end],
        vec![start, (outer.right, start.1), (outer.right, end.1), end],
    ]
}

/// Routes an orthogonal polyline from `source` to `target` that avoids
/// every rectangle in `obstacles`.
///
/// Never fails: when every candidate crosses an obstacle the shortest
/// candidate is returned anyway.
pub fn route(
    source: &Rect,
    target: &Rect,
    obstacles: &[Rect],
    config: &RoutingConfig,
) -> Vec<Point> {
    let (start_side, end_side) = facing_sides(source, target);
    let start = anchor_point(source, start_side);
    let end = anchor_point(target, end_side);
    let inflated: Vec<Rect> = obstacles
        .iter()
        .map(|rect| rect.inflate(config.obstacle_margin))
        .collect();

    let candidates = route_candidates(source, target, start, end, config.route_margin);
    let valid: Vec<&Vec<Point>> = candidates
        .iter()
        .filter(|path| is_orthogonal(path) && !path_hits_any(path, &inflated))
        .collect();
    let pool: Vec<&Vec<Point>> = if valid.is_empty() {
        log::warn!(
            "event=route_fallback module=routing obstacles={} candidates={}",
            obstacles.len(),
            candidates.len()
        );
        candidates.iter().collect()
    } else {
        valid
    };

    let mut best = pool[0];
    let mut best_len = manhattan_length(best);
    for path in pool.iter().skip(1).copied() {
        let len = manhattan_length(path);
        if len < best_len - EPS {
            best = path;
            best_len = len;
        }
    }
    compress_path(best)
}

pub fn is_orthogonal(points: &[Point]) -> bool {
    points.windows(2).all(|segment| {
        let (a, b) = (segment[0], segment[1]);
        (a.0 - b.0).abs() <= EPS || (a.1 - b.1).abs() <= EPS
    })
}

pub fn manhattan_length(points: &[Point]) -> f32 {
    points
        .windows(2)
        .map(|segment| (segment[1].0 - segment[0].0).abs() + (segment[1].1 - segment[0].1).abs())
        .sum()
}

fn path_hits_any(points: &[Point], obstacles: &[Rect]) -> bool {
    points.windows(2).any(|segment| {
        obstacles
            .iter()
            .any(|rect| segment_intersects_rect(segment[0], segment[1], rect))
    })
}

/// Axis-aligned segment vs rectangle. The segment must run strictly inside
/// the rectangle's band on its fixed axis and its span must overlap the
/// rectangle's extent on the moving axis; grazing an edge is not a hit.
pub fn segment_intersects_rect(a: Point, b: Point, rect: &Rect) -> bool {
    if (a.1 - b.1).abs() <= EPS {
        let y = a.1;
        let (min_x, max_x) = (a.0.min(b.0), a.0.max(b.0));
        return y > rect.top && y < rect.bottom && max_x > rect.left && min_x < rect.right;
    }
    if (a.0 - b.0).abs() <= EPS {
        let x = a.0;
        let (min_y, max_y) = (a.1.min(b.1), a.1.max(b.1));
        return x > rect.left && x < rect.right && max_y > rect.top && min_y < rect.bottom;
    }
    // Diagonal segments never come out of the candidate set; treat their
    // bounding box conservatively.
    let (min_x, max_x) = (a.0.min(b.0), a.0.max(b.0));
    let (min_y, max_y) = (a.1.min(b.1), a.1.max(b.1));
    max_x > rect.left && min_x < rect.right && max_y > rect.top && min_y < rect.bottom
}

/// Drops repeated points and the middle of every collinear triple. The
/// first and last point always survive.
pub fn compress_path(points: &[Point]) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    out.push(points[0]);
    for idx in 1..points.len() - 1 {
        let prev = out[out.len() - 1];
        let curr = points[idx];
        if (curr.0 - prev.0).abs() <= EPS && (curr.1 - prev.1).abs() <= EPS {
            continue;
        }
        let next = points[idx + 1];
        let same_x = (prev.0 - curr.0).abs() <= EPS && (curr.0 - next.0).abs() <= EPS;
        let same_y = (prev.1 - curr.1).abs() <= EPS && (curr.1 - next.1).abs() <= EPS;
        if same_x || same_y {
            continue;
        }
        out.push(curr);
    }
    let last = points[points.len() - 1];
    let tail = out[out.len() - 1];
    if out.len() > 1 && (last.0 - tail.0).abs() <= EPS && (last.1 - tail.1).abs() <= EPS {
        out.pop();
    }
    out.push(last);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(left: f32, top: f32, width: f32, height: f32) -> Rect {
        Rect {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    #[test]
    fn facing_sides_follow_the_longer_axis() {
        let a = rect(0.0, 0.0, 100.0, 80.0);
        let right = rect(300.0, 50.0, 100.0, 80.0);
        let below = rect(20.0, 400.0, 100.0, 80.0);
        assert_eq!(facing_sides(&a, &right), (EdgeSide::Right, EdgeSide::Left));
        assert_eq!(facing_sides(&right, &a), (EdgeSide::Left, EdgeSide::Right));
        assert_eq!(facing_sides(&a, &below), (EdgeSide::Bottom, EdgeSide::Top));
        assert_eq!(facing_sides(&below, &a), (EdgeSide::Top, EdgeSide::Bottom));
    }

    #[test]
    fn aligned_cards_route_straight() {
        let source = rect(0.0, 0.0, 120.0, 80.0);
        let target = rect(400.0, 0.0, 120.0, 80.0);
        let path = route(&source, &target, &[], &RoutingConfig::default());
        assert_eq!(path, vec![(120.0, 40.0), (400.0, 40.0)]);
    }

    #[test]
    fn offset_cards_route_with_one_bend() {
        let source = rect(0.0, 0.0, 120.0, 80.0);
        let target = rect(400.0, 100.0, 120.0, 80.0);
        let path = route(&source, &target, &[], &RoutingConfig::default());
        assert_eq!(path.first(), Some(&(120.0, 40.0)));
        assert_eq!(path.last(), Some(&(400.0, 140.0)));
        assert_eq!(path.len(), 3);
        assert!(is_orthogonal(&path));
    }

    #[test]
    fn obstacle_between_forces_a_detour() {
        let source = rect(0.0, 0.0, 120.0, 80.0);
        let target = rect(600.0, 0.0, 120.0, 80.0);
        let blocker = rect(300.0, 0.0, 120.0, 80.0);
        let config = RoutingConfig::default();
        let path = route(&source, &target, &[blocker], &config);
        assert!(is_orthogonal(&path));
        let inflated = blocker.inflate(config.obstacle_margin);
        for segment in path.windows(2) {
            assert!(!segment_intersects_rect(segment[0], segment[1], &inflated));
        }
        assert_eq!(path.first(), Some(&(120.0, 40.0)));
        assert_eq!(path.last(), Some(&(600.0, 40.0)));
    }

    #[test]
    fn fully_blocked_route_falls_back_to_shortest() {
        let source = rect(0.0, 0.0, 120.0, 80.0);
        let target = rect(600.0, 0.0, 120.0, 80.0);
        let wall = rect(-1000.0, -1000.0, 3000.0, 3000.0);
        let path = route(&source, &target, &[wall], &RoutingConfig::default());
        assert_eq!(path, vec![(120.0, 40.0), (600.0, 40.0)]);
    }

    #[test]
    fn segment_grazing_an_edge_is_not_a_hit() {
        let r = rect(10.0, 10.0, 10.0, 10.0);
        assert!(!segment_intersects_rect((0.0, 10.0), (40.0, 10.0), &r));
        assert!(segment_intersects_rect((0.0, 15.0), (40.0, 15.0), &r));
        assert!(segment_intersects_rect((15.0, 0.0), (15.0, 12.0), &r));
        assert!(!segment_intersects_rect((15.0, 0.0), (15.0, 10.0), &r));
    }

    #[test]
    fn compress_keeps_endpoints_and_bends() {
        let points = vec![(0.0, 0.0), (5.0, 0.0), (10.0, 0.0), (10.0, 0.0), (10.0, 8.0), (20.0, 8.0)];
        assert_eq!(
            compress_path(&points),
            vec![(0.0, 0.0), (10.0, 0.0), (10.0, 8.0), (20.0, 8.0)]
        );
        assert_eq!(compress_path(&[(1.0, 1.0), (1.0, 1.0)]), vec![(1.0, 1.0), (1.0, 1.0)]);
    }

    #[test]
    fn manhattan_length_sums_axis_deltas() {
        assert_eq!(manhattan_length(&[(0.0, 0.0), (3.0, 0.0), (3.0, 4.0)]), 7.0);
    }
}
