//! Is a turn really inside a piece, or just close to its boundary?
//!
//! Buffer-style overlays generate rings ("pieces") whose boundaries are only
//! approximately where they should be. A turn point that the side predicates
//! place inside a piece but within a couple of grid units of its boundary is
//! not trusted to be inside.

use serde::{Deserialize, Serialize};

use crate::{
    geom::Point,
    strategy::Strategy,
    within::{point_in_ring, Location},
};

/// Where a turn lies relative to a piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceLocation {
    /// Outside the piece.
    Outside,
    /// Exactly on the piece's boundary.
    OnOffsetted,
    /// Inside, but too close to the boundary to be sure.
    NearOffsetted,
    /// Properly inside.
    Inside,
}

/// The minimum distance, in robust units, that counts as properly inside.
pub const MIN_INSIDE_DISTANCE: f64 = 2.0;

/// The taxicab (L1) distance from `p` to the segment from `a` to `b`.
///
/// Along the segment the distance is convex and piecewise linear, with
/// breaks where the segment crosses `p`'s row or column, so the minimum is at
/// an endpoint or at one of those crossings.
pub fn taxicab_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let dist = |q: &Point| (q.x - p.x).abs() + (q.y - p.y).abs();
    let mut best = dist(a).min(dist(b));
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    if dx != 0.0 {
        let t = (p.x - a.x) / dx;
        if (0.0..=1.0).contains(&t) {
            best = best.min(dist(&a.affine(b, t)));
        }
    }
    if dy != 0.0 {
        let t = (p.y - a.y) / dy;
        if (0.0..=1.0).contains(&t) {
            best = best.min(dist(&a.affine(b, t)));
        }
    }
    best
}

/// Locates a turn's robust point relative to a piece, given as an open ring
/// of robust points.
pub fn turn_in_piece(point: &Point, piece: &[Point], strategy: &Strategy) -> PieceLocation {
    match point_in_ring(point, piece, strategy) {
        Location::Outside => PieceLocation::Outside,
        Location::Boundary => PieceLocation::OnOffsetted,
        Location::Inside => {
            let n = piece.len();
            let distance = (0..n)
                .map(|i| taxicab_distance(point, &piece[i], &piece[(i + 1) % n]))
                .fold(f64::INFINITY, f64::min);
            if distance >= MIN_INSIDE_DISTANCE {
                PieceLocation::Inside
            } else {
                PieceLocation::NearOffsetted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn taxicab() {
        let (a, b) = (p(0.0, 0.0), p(10.0, 0.0));
        assert_eq!(taxicab_distance(&p(5.0, 3.0), &a, &b), 3.0);
        assert_eq!(taxicab_distance(&p(-2.0, 1.0), &a, &b), 3.0);
        // Diagonal: the closest point is straight across in x or y.
        assert_eq!(taxicab_distance(&p(0.0, 4.0), &p(0.0, 0.0), &p(4.0, 4.0)), 4.0);
        assert_eq!(taxicab_distance(&p(1.0, 3.0), &p(0.0, 0.0), &p(4.0, 4.0)), 2.0);
    }

    #[test]
    fn locations() {
        let s = Strategy::exact();
        let piece = [p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)];
        assert_eq!(turn_in_piece(&p(5.0, 5.0), &piece, &s), PieceLocation::Inside);
        assert_eq!(turn_in_piece(&p(2.0, 5.0), &piece, &s), PieceLocation::Inside);
        assert_eq!(turn_in_piece(&p(1.0, 5.0), &piece, &s), PieceLocation::NearOffsetted);
        assert_eq!(turn_in_piece(&p(0.0, 5.0), &piece, &s), PieceLocation::OnOffsetted);
        assert_eq!(turn_in_piece(&p(11.0, 5.0), &piece, &s), PieceLocation::Outside);
    }
}
