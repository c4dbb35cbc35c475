//! Turning a bag of output rings into polygons.

use crate::{
    geom::{signed_area, MultiPolygon, Point, Polygon, Rect, Ring},
    strategy::{Side, Strategy},
    within::{point_in_ring, Location},
};

/// Removes repeated points, and (optionally) vertices that lie on the line
/// through their neighbors. Returns the open ring.
fn clean_ring(mut pts: Vec<Point>, remove_collinear: bool, strategy: &Strategy) -> Vec<Point> {
    pts.dedup();
    while pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    if !remove_collinear {
        return pts;
    }

    // Removing a vertex can make its neighbor collinear, so keep going until
    // nothing changes.
    loop {
        let n = pts.len();
        if n < 3 {
            return pts;
        }
        let collinear = (0..n).find(|&i| {
            let prev = &pts[(i + n - 1) % n];
            let next = &pts[(i + 1) % n];
            strategy.side(prev, &pts[i], next) == Side::Collinear
        });
        match collinear {
            Some(i) => {
                pts.remove(i);
            }
            None => return pts,
        }
    }
}

struct Shell {
    exterior: Vec<Point>,
    envelope: Rect,
    area: f64,
    holes: Vec<Vec<Point>>,
}

fn closed(mut pts: Vec<Point>) -> Ring {
    pts.extend(pts.first().copied());
    Ring(pts)
}

/// Groups rings into polygons.
///
/// Counter-clockwise rings are exteriors, and each clockwise ring becomes a
/// hole of the smallest exterior containing it. A hole that fits in no
/// exterior is dropped.
pub(crate) fn assemble(rings: Vec<Vec<Point>>, remove_collinear: bool) -> MultiPolygon {
    let strategy = Strategy::exact();
    let mut shells = Vec::new();
    let mut holes = Vec::new();
    for ring in rings {
        let pts = clean_ring(ring, remove_collinear, &strategy);
        let area = if pts.len() < 3 { 0.0 } else { signed_area(&pts) };
        if area > 0.0 {
            if let Some(envelope) = Rect::from_points(&pts) {
                shells.push(Shell {
                    exterior: pts,
                    envelope,
                    area,
                    holes: Vec::new(),
                });
            }
        } else if area < 0.0 {
            holes.push(pts);
        } else {
            tracing::debug!(len = pts.len(), "dropping degenerate ring");
        }
    }

    for hole in holes {
        let owner = shells
            .iter()
            .enumerate()
            .filter(|(_, s)| hole.iter().all(|p| s.envelope.contains(p)))
            .filter(|(_, s)| {
                // The first vertex that isn't on the exterior decides. A hole
                // that lies entirely on it (which can't happen for valid
                // output) counts as inside.
                hole.iter()
                    .map(|p| point_in_ring(p, &s.exterior, &strategy))
                    .find(|loc| *loc != Location::Boundary)
                    .map_or(true, |loc| loc == Location::Inside)
            })
            .min_by(|(_, a), (_, b)| a.area.total_cmp(&b.area))
            .map(|(idx, _)| idx);
        match owner {
            Some(idx) => shells[idx].holes.push(hole),
            None => tracing::warn!(len = hole.len(), "hole outside every exterior, dropping it"),
        }
    }

    MultiPolygon(
        shells
            .into_iter()
            .map(|s| Polygon::new(closed(s.exterior), s.holes.into_iter().map(closed).collect()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&c| c.into()).collect()
    }

    #[test]
    fn collinear_and_duplicate_vertices() {
        let ring = pts(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (2.0, 2.0),
            (0.0, 2.0),
            (0.0, 0.0),
        ]);
        let mp = assemble(vec![ring.clone()], true);
        assert_eq!(mp.0.len(), 1);
        assert_eq!(
            mp.0[0].exterior.0,
            pts(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0), (0.0, 0.0)])
        );

        let mp = assemble(vec![ring], false);
        assert_eq!(mp.0[0].exterior.0.len(), 6);
        assert_eq!(mp.area(), 4.0);
    }

    #[test]
    fn holes_go_to_the_smallest_exterior() {
        let big = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let small = pts(&[(1.0, 1.0), (5.0, 1.0), (5.0, 5.0), (1.0, 5.0)]);
        let hole_in_big = pts(&[(6.0, 6.0), (6.0, 8.0), (8.0, 8.0), (8.0, 6.0)]);
        let hole_in_small = pts(&[(2.0, 2.0), (2.0, 3.0), (3.0, 3.0), (3.0, 2.0)]);
        let orphan = pts(&[(20.0, 20.0), (20.0, 21.0), (21.0, 21.0), (21.0, 20.0)]);

        let mp = assemble(vec![hole_in_small, big, orphan, small, hole_in_big], true);
        assert_eq!(mp.0.len(), 2);
        assert_eq!(mp.0[0].interiors.len(), 1);
        assert_eq!(mp.0[0].interiors[0].area(), 4.0);
        assert_eq!(mp.0[1].interiors.len(), 1);
        assert_eq!(mp.0[1].interiors[0].area(), 1.0);
    }

    #[test]
    fn degenerate_rings_are_dropped() {
        let flat = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 0.0)]);
        let spike = pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]);
        assert!(assemble(vec![flat.clone(), spike], true).is_empty());
        assert!(assemble(vec![flat], false).is_empty());
    }
}
