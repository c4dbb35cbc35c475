//! Deciding what to do with rings that traversal never touches.
//!
//! A ring with no active turns lies entirely inside or entirely outside the
//! other geometry, so one point-in-geometry test decides whether it belongs
//! to the output.

use std::collections::BTreeSet;

use crate::{
    geom::Point,
    strategy::Strategy,
    within::Location,
};

use super::{
    prepare::{PreparedGeometry, PreparedRing},
    turns::{RingId, Turn},
    OverlayType,
};

/// Where does a ring lie relative to `other`?
///
/// Tests segment midpoints until one is clearly inside or outside. A ring that
/// lies entirely on the other geometry's boundary comes back as `Boundary`.
fn ring_location(ring: &PreparedRing, other: &PreparedGeometry, strategy: &Strategy) -> Location {
    (0..ring.len())
        .map(|idx| {
            let [a, b] = ring.segment(idx);
            other.locate(&a.robust.midpoint(&b.robust), strategy)
        })
        .find(|loc| *loc != Location::Boundary)
        .unwrap_or(Location::Boundary)
}

fn keeps(overlay: OverlayType, source_index: usize, location: Location) -> bool {
    let inside = match location {
        Location::Inside => true,
        Location::Outside => false,
        // Lying exactly along the other geometry's boundary without making
        // any turns can only happen for rings that were dropped from the
        // turn graph. Keep the first geometry's copy.
        Location::Boundary => return source_index == 0 && overlay != OverlayType::Difference,
    };
    match (overlay, source_index) {
        (OverlayType::Union, _) => !inside,
        (OverlayType::Intersection, _) => inside,
        (OverlayType::Difference, 0) => !inside,
        (OverlayType::Difference, _) => inside,
    }
}

/// Returns the rings (closed, in input coordinates) that have no active turns
/// but belong to the output anyway.
pub(crate) fn select_rings(
    geometries: &[PreparedGeometry; 2],
    turns: &[Turn],
    overlay: OverlayType,
    strategy: &Strategy,
) -> Vec<Vec<Point>> {
    let touched: BTreeSet<RingId> = turns
        .iter()
        .filter(|t| !t.discarded)
        .flat_map(|t| t.operations.iter().map(|op| op.seg_id.ring()))
        .collect();

    let mut ret = Vec::new();
    for (source_index, geometry) in geometries.iter().enumerate() {
        let other = &geometries[1 - source_index];
        for ring in geometry.rings.iter().filter(|r| !touched.contains(&r.id)) {
            let location = ring_location(ring, other, strategy);
            let keep = keeps(overlay, source_index, location);
            tracing::trace!(ring = ?ring.id, ?location, keep, "untouched ring");
            if keep {
                let mut pts: Vec<Point> = ring.vertices.iter().map(|v| v.point).collect();
                pts.extend(pts.first().copied());
                ret.push(pts);
            }
        }
    }
    tracing::debug!(count = ret.len(), "selected untouched rings");
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geom::{tests::square, MultiPolygon, Rect},
        overlay::{prepare::prepare, turns::get_turns},
    };

    fn selected(a: MultiPolygon, b: MultiPolygon, overlay: OverlayType) -> Vec<Vec<Point>> {
        let s = Strategy::exact();
        let reverse_b = overlay == OverlayType::Difference;
        let geoms = [
            prepare(&a, 0, false, &s).unwrap(),
            prepare(&b, 1, reverse_b, &s).unwrap(),
        ];
        let turns = get_turns(&geoms, &s).unwrap();
        select_rings(&geoms, &turns, overlay, &s)
    }

    fn areas(rings: &[Vec<Point>]) -> Vec<f64> {
        rings
            .iter()
            .map(|r| crate::geom::signed_area(&r[..r.len() - 1]))
            .collect()
    }

    #[test]
    fn disjoint_squares() {
        let a = || square(0.0, 0.0, 1.0, 1.0).into();
        let b = || square(5.0, 0.0, 6.0, 1.0).into();
        assert_eq!(areas(&selected(a(), b(), OverlayType::Union)), vec![1.0, 1.0]);
        assert!(selected(a(), b(), OverlayType::Intersection).is_empty());
        assert_eq!(areas(&selected(a(), b(), OverlayType::Difference)), vec![1.0]);
    }

    #[test]
    fn nested_squares() {
        let outer = || square(0.0, 0.0, 10.0, 10.0).into();
        let inner = || square(2.0, 2.0, 3.0, 3.0).into();
        assert_eq!(areas(&selected(outer(), inner(), OverlayType::Union)), vec![100.0]);
        assert_eq!(
            areas(&selected(outer(), inner(), OverlayType::Intersection)),
            vec![1.0]
        );
        // The reversed inner square becomes a hole.
        assert_eq!(
            areas(&selected(outer(), inner(), OverlayType::Difference)),
            vec![100.0, -1.0]
        );
        assert!(selected(inner(), outer(), OverlayType::Difference).is_empty());
    }

    #[test]
    fn square_inside_a_hole() {
        let mut a = square(0.0, 0.0, 10.0, 10.0);
        a.interiors.push(Rect::new((2.0, 2.0), (8.0, 8.0)).to_ring());
        let b = square(4.0, 4.0, 6.0, 6.0);
        // B sits in A's hole, so it is outside A.
        assert_eq!(
            areas(&selected(a.clone().into(), b.clone().into(), OverlayType::Union)),
            vec![100.0, -36.0, 4.0]
        );
        assert!(selected(a.into(), b.into(), OverlayType::Intersection).is_empty());
    }
}
