//! Turning input polygons into the engine's working form.
//!
//! A prepared geometry has every ring oriented the same way (exterior
//! counter-clockwise, holes clockwise, so that the interior is always on the
//! left), optionally reversed (so that difference can run as intersection
//! with the complement), and mapped into robust space with consecutive
//! duplicates removed.

use crate::{
    error::{OverlayError, Result},
    geom::{signed_area, MultiPolygon, Point, Ring},
    intersection::Vertex,
    strategy::Strategy,
    within::{point_in_rings, Location},
};

use super::turns::RingId;

/// One ring, ready for the overlay.
///
/// The ring is stored open: there is no repeated closing vertex. Segment `i`
/// runs from vertex `i` to vertex `(i + 1) % len`.
#[derive(Clone, Debug)]
pub(crate) struct PreparedRing {
    pub id: RingId,
    pub vertices: Vec<Vertex>,
}

impl PreparedRing {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertex(&self, idx: usize) -> &Vertex {
        &self.vertices[idx % self.vertices.len()]
    }

    /// The start and end of segment `idx`.
    pub fn segment(&self, idx: usize) -> [&Vertex; 2] {
        [self.vertex(idx), self.vertex(idx + 1)]
    }

    fn robust_points(&self) -> Vec<Point> {
        self.vertices.iter().map(|v| v.robust).collect()
    }
}

/// One input, ready for the overlay.
#[derive(Clone, Debug)]
pub(crate) struct PreparedGeometry {
    /// All the rings, sorted by id. Each polygon's exterior comes right before its holes.
    pub rings: Vec<PreparedRing>,
}

impl PreparedGeometry {
    pub fn ring(&self, id: &RingId) -> Option<&PreparedRing> {
        self.rings
            .binary_search_by(|r| r.id.cmp(id))
            .ok()
            .map(|idx| &self.rings[idx])
    }

    /// Locates a robust point relative to the area covered by this geometry.
    ///
    /// Orientation is ignored, so a reversed geometry covers the same area as
    /// the original one.
    pub fn locate(&self, p: &Point, strategy: &Strategy) -> Location {
        let mut ret = Location::Outside;
        for polygon in self.rings.chunk_by(|a, b| a.id.multi_index == b.id.multi_index) {
            let pts: Vec<Vec<Point>> = polygon.iter().map(PreparedRing::robust_points).collect();
            match point_in_rings(p, pts.iter().map(Vec::as_slice), strategy) {
                Location::Inside => return Location::Inside,
                Location::Boundary => ret = Location::Boundary,
                Location::Outside => {}
            }
        }
        ret
    }
}

/// Checks that every coordinate is finite.
pub(crate) fn check_finite(mp: &MultiPolygon) -> Result<()> {
    let all_finite = mp
        .0
        .iter()
        .flat_map(|p| p.rings())
        .flat_map(|r| &r.0)
        .all(Point::is_finite);
    if all_finite {
        Ok(())
    } else {
        Err(OverlayError::NotFinite)
    }
}

fn dedup_closed(pts: &mut Vec<Point>) {
    pts.dedup();
    while pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
}

fn prepare_ring(
    ring: &Ring,
    id: RingId,
    exterior: bool,
    reverse: bool,
    strategy: &Strategy,
) -> Result<Option<PreparedRing>> {
    let mut pts = ring.0.clone();
    dedup_closed(&mut pts);
    if pts.len() < 3 {
        return Err(OverlayError::InvalidInput(format!(
            "ring {id:?} has fewer than three distinct points"
        )));
    }
    let area = signed_area(&pts);
    if area == 0.0 {
        return Err(OverlayError::InvalidInput(format!(
            "ring {id:?} encloses no area"
        )));
    }

    // Exteriors are counter-clockwise and holes are clockwise, and then
    // possibly everything gets flipped.
    let want_ccw = exterior != reverse;
    if (area > 0.0) != want_ccw {
        pts.reverse();
    }

    let mut vertices: Vec<Vertex> = pts
        .into_iter()
        .map(|point| Vertex {
            point,
            robust: strategy.to_robust(&point),
        })
        .collect();
    vertices.dedup_by(|b, a| a.robust == b.robust);
    while vertices.len() > 1 && vertices.first().map(|v| v.robust) == vertices.last().map(|v| v.robust) {
        vertices.pop();
    }

    let robust: Vec<Point> = vertices.iter().map(|v| v.robust).collect();
    if robust.len() < 3 || signed_area(&robust) == 0.0 {
        tracing::debug!(?id, "ring collapsed in robust space, dropping it");
        return Ok(None);
    }
    Ok(Some(PreparedRing { id, vertices }))
}

/// Prepares an input for the overlay.
///
/// Rings that are too small to survive the mapping into robust space are
/// dropped (along with their holes, if it's an exterior that collapsed).
pub(crate) fn prepare(
    mp: &MultiPolygon,
    source_index: usize,
    reverse: bool,
    strategy: &Strategy,
) -> Result<PreparedGeometry> {
    let mut rings = Vec::new();
    for (multi_index, polygon) in mp.0.iter().enumerate() {
        let exterior_id = RingId {
            source_index,
            multi_index,
            ring_index: None,
        };
        let Some(exterior) = prepare_ring(&polygon.exterior, exterior_id, true, reverse, strategy)?
        else {
            continue;
        };
        rings.push(exterior);

        for (hole_index, hole) in polygon.interiors.iter().enumerate() {
            let id = RingId {
                source_index,
                multi_index,
                ring_index: Some(hole_index),
            };
            if let Some(ring) = prepare_ring(hole, id, false, reverse, strategy)? {
                rings.push(ring);
            }
        }
    }
    Ok(PreparedGeometry { rings })
}
