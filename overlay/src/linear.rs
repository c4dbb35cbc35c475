//! Overlaying linestrings with areas.
//!
//! A linestring is cut wherever it meets the area's boundary. Each piece
//! between two cuts then lies entirely inside, outside or along the boundary,
//! so testing its midpoint says whether it belongs to the output.

use crate::{
    error::{OverlayError, Result},
    geom::{GeometryKind, LineString, MultiLineString, MultiPolygon, Point, Rect},
    intersection::{intersect, Vertex},
    num::SegmentRatio,
    overlay::{
        prepare::{check_finite, prepare, PreparedGeometry},
        OverlayType,
    },
    sections::{sectionalize, Section},
    strategy::{RobustnessPolicy, Strategy},
    within::Location,
};

struct Boundary<'a> {
    geometry: &'a PreparedGeometry,
    sections: Vec<Section>,
}

impl Boundary<'_> {
    /// The places strictly inside the segment from `a` to `b` where it meets
    /// the boundary, in order along the segment.
    fn cuts(&self, a: &Vertex, b: &Vertex, strategy: &Strategy) -> Result<Vec<(SegmentRatio, Vertex)>> {
        let envelope = Rect::new(a.robust, b.robust);
        let mut ret = Vec::new();
        for section in self.sections.iter().filter(|s| s.envelope.intersects(&envelope)) {
            let ring = &self.geometry.rings[section.ring];
            for idx in section.segments.clone() {
                let [c, d] = ring.segment(idx);
                for ip in intersect([a, b], [c, d], strategy)?.points {
                    let [along, _] = ip.fractions;
                    if along.in_interior() {
                        ret.push((
                            along,
                            Vertex {
                                point: ip.point,
                                robust: ip.robust_point,
                            },
                        ));
                    }
                }
            }
        }
        ret.sort_by(|x, y| x.0.cmp(&y.0));
        ret.dedup_by(|x, y| x.0 == y.0);
        Ok(ret)
    }
}

fn split_line(
    line: &LineString,
    boundary: &Boundary<'_>,
    keep: impl Fn(Location) -> bool,
    strategy: &Strategy,
    out: &mut Vec<LineString>,
) -> Result<()> {
    let mut vertices: Vec<Vertex> = line
        .0
        .iter()
        .map(|p| Vertex {
            point: *p,
            robust: strategy.to_robust(p),
        })
        .collect();
    vertices.dedup_by(|b, a| a.robust == b.robust);

    // Every vertex and cut, in order.
    let mut stops: Vec<Vertex> = Vec::new();
    for w in vertices.windows(2) {
        stops.push(w[0]);
        stops.extend(boundary.cuts(&w[0], &w[1], strategy)?.into_iter().map(|(_, v)| v));
    }
    stops.extend(vertices.last().copied());
    stops.dedup_by(|b, a| a.robust == b.robust);

    let mut current: Vec<Point> = Vec::new();
    for w in stops.windows(2) {
        let mid = w[0].robust.midpoint(&w[1].robust);
        if keep(boundary.geometry.locate(&mid, strategy)) {
            if current.is_empty() {
                current.push(w[0].point);
            }
            current.push(w[1].point);
        } else if current.len() >= 2 {
            out.push(LineString(std::mem::take(&mut current)));
        } else {
            current.clear();
        }
    }
    if current.len() >= 2 {
        out.push(LineString(current));
    }
    Ok(())
}

/// Intersects, or subtracts, an area from some linestrings.
///
/// Intersection keeps the parts of the lines that are inside the area or
/// along its boundary, and difference keeps the parts outside it. The union
/// of lines and areas isn't a linear geometry, so it is rejected.
pub fn overlay_linear(
    lines: &MultiLineString,
    area: &MultiPolygon,
    overlay: OverlayType,
    policy: RobustnessPolicy,
) -> Result<MultiLineString> {
    let keep: fn(Location) -> bool = match overlay {
        OverlayType::Intersection => |loc| loc != Location::Outside,
        OverlayType::Difference => |loc| loc == Location::Outside,
        OverlayType::Union => {
            return Err(OverlayError::UnsupportedCombination {
                first: GeometryKind::MultiLineString,
                second: GeometryKind::MultiPolygon,
            })
        }
    };
    if !lines.0.iter().flat_map(|l| &l.0).all(Point::is_finite) {
        return Err(OverlayError::NotFinite);
    }
    check_finite(area)?;

    let line_envelope = Rect::from_points(lines.0.iter().flat_map(|l| &l.0));
    let envelope = match (line_envelope, area.envelope()) {
        (Some(a), Some(b)) => Some(a.union(&b)),
        (a, b) => a.or(b),
    };
    let strategy = Strategy::new(policy, envelope);
    let geometry = prepare(area, 0, false, &strategy)?;
    let boundary = Boundary {
        sections: geometry
            .rings
            .iter()
            .enumerate()
            .flat_map(|(idx, ring)| sectionalize(idx, &ring.vertices, true))
            .collect(),
        geometry: &geometry,
    };

    let mut ret = Vec::new();
    for line in &lines.0 {
        split_line(line, &boundary, keep, &strategy, &mut ret)?;
    }
    tracing::debug!(?overlay, pieces = ret.len(), "linear overlay");
    Ok(MultiLineString(ret))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::geom::tests::square;

    fn lines(coords: &[(f64, f64)]) -> MultiLineString {
        MultiLineString(vec![coords.iter().copied().collect()])
    }

    #[test]
    fn line_through_a_square() {
        let area: MultiPolygon = square(0.0, 0.0, 2.0, 2.0).into();
        let l = lines(&[(-1.0, 1.0), (3.0, 1.0)]);

        let inside = overlay_linear(&l, &area, OverlayType::Intersection, RobustnessPolicy::Exact).unwrap();
        assert_eq!(inside, lines(&[(0.0, 1.0), (2.0, 1.0)]));

        let outside = overlay_linear(&l, &area, OverlayType::Difference, RobustnessPolicy::Exact).unwrap();
        assert_eq!(
            outside,
            MultiLineString(vec![
                [(-1.0, 1.0), (0.0, 1.0)].into_iter().collect(),
                [(2.0, 1.0), (3.0, 1.0)].into_iter().collect(),
            ])
        );
    }

    #[test]
    fn pieces_along_the_boundary_count_as_inside() {
        let area: MultiPolygon = square(0.0, 0.0, 2.0, 2.0).into();
        let l = lines(&[(-1.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        let inside = overlay_linear(&l, &area, OverlayType::Intersection, RobustnessPolicy::Rescale).unwrap();
        assert_eq!(inside, lines(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]));
        assert_eq!(inside.length(), 2.0);
    }

    #[test]
    fn hole_splits_the_line() {
        let mut poly = square(0.0, 0.0, 10.0, 10.0);
        poly.interiors.push(Rect::new((4.0, 4.0), (6.0, 6.0)).to_ring());
        let area: MultiPolygon = poly.into();
        let l = lines(&[(1.0, 5.0), (9.0, 5.0)]);
        let inside = overlay_linear(&l, &area, OverlayType::Intersection, RobustnessPolicy::Exact).unwrap();
        assert_eq!(inside.0.len(), 2);
        assert_eq!(inside.length(), 6.0);
    }

    #[test]
    fn union_is_rejected() {
        let area: MultiPolygon = square(0.0, 0.0, 1.0, 1.0).into();
        let l = lines(&[(0.0, 0.0), (1.0, 1.0)]);
        assert_matches!(
            overlay_linear(&l, &area, OverlayType::Union, RobustnessPolicy::Rescale),
            Err(OverlayError::UnsupportedCombination { .. })
        );
    }
}
