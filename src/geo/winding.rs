use itertools::Itertools;
use super::Coordinate;

/// Shapefiles store shells clockwise and holes counter-clockwise.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum WindingOrder {
    Clockwise,
    CounterClockwise,
}

/// Twice the signed area of a closed ring. Positive means counter-clockwise
/// (y axis pointing up).
fn signed_area2(points: &[Coordinate]) -> f64 {
    // https://en.wikipedia.org/wiki/Shoelace_formula
    let mut a = 0.;
    for (p1, p2) in points.iter().tuple_windows() {
        a += p1.x * p2.y - p2.x * p1.y;
    }
    a
}

/// Winding order of a closed ring.
///
/// Degenerate rings (zero area) are reported as clockwise, so they are kept
/// as shells rather than attached to some other ring as holes.
pub fn winding_order(points: &[Coordinate]) -> WindingOrder {
    if signed_area2(points) > 0. {
        WindingOrder::CounterClockwise
    } else {
        WindingOrder::Clockwise
    }
}

/// Copy of `ring` wound in `order`.
pub fn with_winding_order(ring: &[Coordinate], order: WindingOrder) -> Vec<Coordinate> {
    let mut ret = ring.to_vec();
    if ring.len() > 2 && winding_order(ring) != order {
        ret.reverse();
    }
    ret
}

/// Ray-casting point-in-ring test. Points on a vertex count as inside.
pub fn ring_contains(ring: &[Coordinate], p: &Coordinate) -> bool {
    if ring.iter().any(|c| c.equals_2d(p)) {
        return true;
    }

    let mut inside = false;
    for (a, b) in ring.iter().tuple_windows() {
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}
