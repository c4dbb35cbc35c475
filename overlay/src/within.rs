//! Point-in-ring and point-in-polygon tests.
//!
//! These ignore ring orientation: a point is inside a ring if the ring winds
//! around it at all.

use crate::{
    geom::{MultiPolygon, Point, Polygon},
    strategy::{Side, Strategy},
};

/// Where a point is, relative to an area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    /// Strictly inside.
    Inside,
    /// On the boundary.
    Boundary,
    /// Strictly outside.
    Outside,
}

fn on_segment(p: &Point, a: &Point, b: &Point, strategy: &Strategy) -> bool {
    strategy.side(a, b, p) == Side::Collinear
        && (a.x.min(b.x)..=a.x.max(b.x)).contains(&p.x)
        && (a.y.min(b.y)..=a.y.max(b.y)).contains(&p.y)
}

/// Locates `p` relative to the ring with vertices `ring`.
///
/// The ring is implicitly closed; a repeated closing point is harmless.
pub fn point_in_ring(p: &Point, ring: &[Point], strategy: &Strategy) -> Location {
    let n = ring.len();
    if n == 0 {
        return Location::Outside;
    }

    let mut winding = 0i32;
    for i in 0..n {
        let a = &ring[i];
        let b = &ring[(i + 1) % n];
        if on_segment(p, a, b, strategy) {
            return Location::Boundary;
        }
        if a.y <= p.y {
            if b.y > p.y && strategy.side(a, b, p) == Side::Left {
                winding += 1;
            }
        } else if b.y <= p.y && strategy.side(a, b, p) == Side::Right {
            winding -= 1;
        }
    }

    if winding != 0 {
        Location::Inside
    } else {
        Location::Outside
    }
}

/// Locates `p` relative to a polygon given as rings, exterior first.
pub(crate) fn point_in_rings<'a>(
    p: &Point,
    mut rings: impl Iterator<Item = &'a [Point]>,
    strategy: &Strategy,
) -> Location {
    let Some(exterior) = rings.next() else {
        return Location::Outside;
    };
    match point_in_ring(p, exterior, strategy) {
        Location::Inside => {}
        loc => return loc,
    }
    for hole in rings {
        match point_in_ring(p, hole, strategy) {
            Location::Inside => return Location::Outside,
            Location::Boundary => return Location::Boundary,
            Location::Outside => {}
        }
    }
    Location::Inside
}

/// Locates `p` relative to a polygon.
pub fn point_in_polygon(p: &Point, polygon: &Polygon, strategy: &Strategy) -> Location {
    point_in_rings(p, polygon.rings().map(|r| r.0.as_slice()), strategy)
}

/// Locates `p` relative to a multi-polygon.
///
/// The polygons are assumed not to overlap.
pub fn point_in_multi_polygon(p: &Point, mp: &MultiPolygon, strategy: &Strategy) -> Location {
    let mut ret = Location::Outside;
    for poly in &mp.0 {
        match point_in_polygon(p, poly, strategy) {
            Location::Inside => return Location::Inside,
            Location::Boundary => ret = Location::Boundary,
            Location::Outside => {}
        }
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{tests::square, Rect};

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn ring_either_orientation() {
        let s = Strategy::exact();
        let ccw = Rect::new((0.0, 0.0), (2.0, 2.0)).to_ring();
        let cw = ccw.reversed();
        for ring in [&ccw, &cw] {
            assert_eq!(point_in_ring(&p(1.0, 1.0), &ring.0, &s), Location::Inside);
            assert_eq!(point_in_ring(&p(3.0, 1.0), &ring.0, &s), Location::Outside);
            assert_eq!(point_in_ring(&p(2.0, 1.0), &ring.0, &s), Location::Boundary);
            assert_eq!(point_in_ring(&p(0.0, 0.0), &ring.0, &s), Location::Boundary);
        }
    }

    #[test]
    fn ray_through_vertex() {
        let s = Strategy::exact();
        // A diamond, with a vertex at the same height as the query point.
        let diamond = [p(1.0, 0.0), p(2.0, 1.0), p(1.0, 2.0), p(0.0, 1.0)];
        assert_eq!(point_in_ring(&p(1.0, 1.0), &diamond, &s), Location::Inside);
        assert_eq!(point_in_ring(&p(-1.0, 1.0), &diamond, &s), Location::Outside);
        assert_eq!(point_in_ring(&p(3.0, 1.0), &diamond, &s), Location::Outside);
    }

    #[test]
    fn polygon_with_hole() {
        let s = Strategy::exact();
        let mut poly = square(0.0, 0.0, 10.0, 10.0);
        poly.interiors
            .push(Rect::new((4.0, 4.0), (6.0, 6.0)).to_ring().reversed());

        assert_eq!(point_in_polygon(&p(1.0, 1.0), &poly, &s), Location::Inside);
        assert_eq!(point_in_polygon(&p(5.0, 5.0), &poly, &s), Location::Outside);
        assert_eq!(point_in_polygon(&p(4.0, 5.0), &poly, &s), Location::Boundary);

        let mp = MultiPolygon(vec![poly, square(20.0, 0.0, 21.0, 1.0)]);
        assert_eq!(
            point_in_multi_polygon(&p(20.5, 0.5), &mp, &s),
            Location::Inside
        );
        assert_eq!(
            point_in_multi_polygon(&p(15.0, 0.5), &mp, &s),
            Location::Outside
        );
    }
}
