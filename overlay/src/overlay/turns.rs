//! Turns: the places where the boundaries of the two inputs meet.
//!
//! A turn records a point where a segment of the first geometry meets a
//! segment of the second, together with one [`TurnOperation`] per geometry
//! saying what the overlay should do when it leaves the turn along that
//! geometry's boundary.

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    geom::{MultiPolygon, Point},
    intersection::{intersect, Method, SegmentIntersection},
    num::SegmentRatio,
    sections::{overlapping_pairs, sectionalize, self_overlapping_pairs, Section},
    strategy::{RobustnessPolicy, Side, Strategy},
};

use super::prepare::{check_finite, prepare, PreparedGeometry, PreparedRing};

/// Identifies a ring of one of the inputs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RingId {
    /// Which input (0 or 1).
    pub source_index: usize,
    /// Which polygon of the input.
    pub multi_index: usize,
    /// Which hole of the polygon, or `None` for the exterior.
    pub ring_index: Option<usize>,
}

impl std::fmt::Debug for RingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.ring_index {
            None => write!(f, "r_{}.{}.ext", self.source_index, self.multi_index),
            Some(i) => write!(f, "r_{}.{}.{}", self.source_index, self.multi_index, i),
        }
    }
}

/// Identifies a segment of one of the inputs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId {
    /// Which input (0 or 1).
    pub source_index: usize,
    /// Which polygon of the input.
    pub multi_index: usize,
    /// Which hole of the polygon, or `None` for the exterior.
    pub ring_index: Option<usize>,
    /// Which segment of the ring. Segment `i` starts at vertex `i`.
    pub segment_index: usize,
}

impl std::fmt::Debug for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}:{}", self.ring(), self.segment_index)
    }
}

impl SegmentId {
    fn new(ring: RingId, segment_index: usize) -> Self {
        SegmentId {
            source_index: ring.source_index,
            multi_index: ring.multi_index,
            ring_index: ring.ring_index,
            segment_index,
        }
    }

    /// The ring this segment belongs to.
    pub fn ring(&self) -> RingId {
        RingId {
            source_index: self.source_index,
            multi_index: self.multi_index,
            ring_index: self.ring_index,
        }
    }
}

/// An index into a list of turns.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TurnIdx(pub usize);

impl std::fmt::Debug for TurnIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t_{}", self.0)
    }
}

/// An index into a list of clusters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterIdx(pub usize);

impl std::fmt::Debug for ClusterIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c_{}", self.0)
    }
}

/// What the overlay does when it leaves a turn along one geometry's boundary.
///
/// The tag describes where the *other* geometry is, on the two sides of the
/// outgoing edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Not classified (yet).
    #[default]
    None,
    /// The other geometry is on neither side: this edge bounds the union.
    Union,
    /// The other geometry is on both sides: this edge bounds the intersection.
    Intersection,
    /// The outgoing edge isn't a boundary of this geometry at this turn.
    Blocked,
    /// The other geometry is on the left only. The edge runs along a same-direction
    /// edge of the other geometry, and bounds both union and intersection.
    Continue,
    /// The other geometry is on the right only. The edge runs along an
    /// opposite-direction edge of the other geometry, and bounds neither.
    Opposite,
}

/// The enrichment of a [`TurnOperation`]: how it connects to the rest of the turn graph.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentInfo {
    /// The turn reached by walking forward along this ring from here.
    pub travels_to_ip_index: Option<TurnIdx>,
    /// The first vertex passed on the way there.
    pub travels_to_vertex_index: Option<usize>,
    /// The next turn on the same segment, if there is one.
    pub next_ip_index: Option<TurnIdx>,
    /// How many selectable edges arrive at the target turn (or its cluster).
    pub count_left_incoming: usize,
    /// The biconnected component of the edge leaving from here.
    pub component_id: Option<usize>,
}

/// One geometry's view of a turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnOperation {
    /// The segment this operation is on.
    pub seg_id: SegmentId,
    /// What happens when leaving along this geometry's boundary.
    pub operation: Operation,
    /// How far along the segment the turn is.
    pub fraction: SegmentRatio,
    /// How this operation connects to the rest of the graph.
    pub enriched: EnrichmentInfo,
}

impl TurnOperation {
    fn new(seg_id: SegmentId, fraction: SegmentRatio) -> Self {
        TurnOperation {
            seg_id,
            operation: Operation::None,
            fraction,
            enriched: EnrichmentInfo::default(),
        }
    }

    /// The position of this operation along its ring.
    pub(crate) fn position(&self) -> (RingId, usize, &SegmentRatio) {
        (self.seg_id.ring(), self.seg_id.segment_index, &self.fraction)
    }
}

/// A point where the boundaries of the two inputs meet.
#[derive(Clone, Debug, PartialEq)]
pub struct Turn {
    /// Where the turn is, in input coordinates.
    pub point: Point,
    /// Where the turn is, in robust space.
    pub robust_point: Point,
    /// How the two segments met.
    pub method: Method,
    /// `operations[i]` belongs to geometry `i`.
    pub operations: [TurnOperation; 2],
    /// Should this turn be ignored by the rest of the pipeline?
    pub discarded: bool,
    /// Is this turn at the tip of a spike?
    pub spike: bool,
    /// The cluster this turn belongs to, if it coincides with other turns.
    pub cluster_id: Option<ClusterIdx>,
}

impl Turn {
    /// Do both operations have this tag?
    pub fn both(&self, op: Operation) -> bool {
        self.operations.iter().all(|o| o.operation == op)
    }

    /// Does either operation have this tag?
    pub fn has(&self, op: Operation) -> bool {
        self.operations.iter().any(|o| o.operation == op)
    }

    /// A lone turn where the two boundaries just touch, with both leaving
    /// edges bounding the union.
    pub fn is_uu_touch(&self) -> bool {
        self.cluster_id.is_none()
            && matches!(self.method, Method::Touch | Method::TouchInterior)
            && self.both(Operation::Union)
    }
}

/// Is the vertex at the start of segment `seg` the tip of a spike?
fn is_spike_at(ring: &PreparedRing, seg: usize, strategy: &Strategy) -> bool {
    let n = ring.len();
    let prev = &ring.vertex(seg + n - 1).robust;
    let here = &ring.vertex(seg).robust;
    let next = &ring.vertex(seg + 1).robust;
    strategy.side(prev, here, next) == Side::Collinear && strategy.same_direction(here, prev, next)
}

fn sections_of(rings: &[PreparedRing]) -> Vec<Section> {
    rings
        .iter()
        .enumerate()
        .flat_map(|(idx, r)| sectionalize(idx, &r.vertices, true))
        .collect()
}

/// Converts the intersection of two segments into turns.
///
/// Points at the end of either segment aren't turned into turns: they'll be
/// found again at the start of the next segment.
fn add_turns(
    turns: &mut Vec<Turn>,
    isect: SegmentIntersection,
    seg_ids: [SegmentId; 2],
    rings: [&PreparedRing; 2],
    strategy: &Strategy,
) {
    let crossing_ops = (isect.method == Method::Crosses).then(|| {
        let [_, a1, _, b1] = isect.sides;
        let op = |s: Side| {
            if s == Side::Left {
                Operation::Intersection
            } else {
                Operation::Union
            }
        };
        [op(a1), op(b1)]
    });

    for ip in isect.points {
        if ip.fractions.iter().any(SegmentRatio::is_one) {
            continue;
        }
        let [f0, f1] = ip.fractions;
        let spike = (f0.is_zero() && is_spike_at(rings[0], seg_ids[0].segment_index, strategy))
            || (f1.is_zero() && is_spike_at(rings[1], seg_ids[1].segment_index, strategy));
        let mut operations = [
            TurnOperation::new(seg_ids[0], f0),
            TurnOperation::new(seg_ids[1], f1),
        ];
        if let Some(ops) = crossing_ops {
            operations[0].operation = ops[0];
            operations[1].operation = ops[1];
        }

        tracing::trace!(point = ?ip.point, method = ?isect.method, ?seg_ids, "turn");
        turns.push(Turn {
            point: ip.point,
            robust_point: ip.robust_point,
            method: isect.method,
            operations,
            discarded: spike,
            spike,
            cluster_id: None,
        });
    }
}

fn segment_pair_turns(
    turns: &mut Vec<Turn>,
    rings: [&PreparedRing; 2],
    segs: [usize; 2],
    strategy: &Strategy,
) -> Result<()> {
    let p = rings[0].segment(segs[0]);
    let q = rings[1].segment(segs[1]);
    let p_box = crate::geom::Rect::new(p[0].robust, p[1].robust);
    let q_box = crate::geom::Rect::new(q[0].robust, q[1].robust);
    if !p_box.intersects(&q_box) {
        return Ok(());
    }
    let isect = intersect(p, q, strategy)?;
    if isect.method != Method::None {
        let seg_ids = [
            SegmentId::new(rings[0].id, segs[0]),
            SegmentId::new(rings[1].id, segs[1]),
        ];
        add_turns(turns, isect, seg_ids, rings, strategy);
    }
    Ok(())
}

/// Finds all the turns between two prepared geometries.
pub(crate) fn get_turns(geometries: &[PreparedGeometry; 2], strategy: &Strategy) -> Result<Vec<Turn>> {
    let sections = [
        sections_of(&geometries[0].rings),
        sections_of(&geometries[1].rings),
    ];
    let mut turns = Vec::new();
    for (i, j) in overlapping_pairs(&sections[0], &sections[1]) {
        let (sa, sb) = (&sections[0][i], &sections[1][j]);
        let rings = [&geometries[0].rings[sa.ring], &geometries[1].rings[sb.ring]];
        for s in sa.segments.clone() {
            for r in sb.segments.clone() {
                segment_pair_turns(&mut turns, rings, [s, r], strategy)?;
            }
        }
    }
    tracing::debug!(count = turns.len(), "found turns");
    Ok(turns)
}

pub(crate) fn get_self_turns(geometry: &PreparedGeometry, strategy: &Strategy) -> Result<Vec<Turn>> {
    let sections = sections_of(&geometry.rings);
    let mut turns = Vec::new();
    for (i, j) in self_overlapping_pairs(&sections) {
        let (sa, sb) = (&sections[i], &sections[j]);
        let rings = [&geometry.rings[sa.ring], &geometry.rings[sb.ring]];
        let same_ring = sa.ring == sb.ring;
        for s in sa.segments.clone() {
            for r in sb.segments.clone() {
                // Each pair of segments of one ring is only looked at once.
                if same_ring && r <= s {
                    continue;
                }
                segment_pair_turns(&mut turns, rings, [s, r], strategy)?;
            }
        }
    }
    Ok(turns)
}

/// Finds the places where a multi-polygon's boundary meets itself.
///
/// Adjacent segments of a ring always meet at their shared vertex; those
/// meetings aren't reported. Everything else is: a valid multi-polygon has
/// only `Touch` and `TouchInterior` self-turns, and those only between
/// different rings.
pub fn self_turns(mp: &MultiPolygon, policy: RobustnessPolicy) -> Result<Vec<Turn>> {
    check_finite(mp)?;
    let strategy = Strategy::new(policy, mp.envelope());
    let geometry = prepare(mp, 0, false, &strategy)?;
    get_self_turns(&geometry, &strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geom::{tests::square, Polygon, Ring},
        strategy::RobustnessPolicy,
    };

    fn prepared(mp: &MultiPolygon, source: usize) -> PreparedGeometry {
        prepare(mp, source, false, &Strategy::exact()).unwrap()
    }

    #[test]
    fn crossing_squares() {
        let a = prepared(&square(0.0, 0.0, 2.0, 2.0).into(), 0);
        let b = prepared(&square(1.0, 1.0, 3.0, 3.0).into(), 1);
        let turns = get_turns(&[a, b], &Strategy::exact()).unwrap();
        assert_eq!(turns.len(), 2);
        for t in &turns {
            assert_eq!(t.method, Method::Crosses);
            assert!(t.has(Operation::Union));
            assert!(t.has(Operation::Intersection));
        }

        // A's right edge, going up, enters B at (2, 1).
        let t = turns
            .iter()
            .find(|t| t.point == Point::new(2.0, 1.0))
            .unwrap();
        assert_eq!(t.operations[0].operation, Operation::Intersection);
        assert_eq!(t.operations[1].operation, Operation::Union);
        assert_eq!(t.operations[0].seg_id.segment_index, 1);
    }

    #[test]
    fn shared_vertex_is_reported_once() {
        // Two squares sharing the edge x = 1.
        let a = prepared(&square(0.0, 0.0, 1.0, 1.0).into(), 0);
        let b = prepared(&square(1.0, 0.0, 2.0, 1.0).into(), 1);
        let turns = get_turns(&[a, b], &Strategy::exact()).unwrap();
        let mut points: Vec<_> = turns.iter().map(|t| (t.point.x, t.point.y)).collect();
        points.sort_by(|p, q| p.partial_cmp(q).unwrap());
        // Each shared corner shows up exactly once per pair of ring passes.
        assert_eq!(points, vec![(1.0, 0.0), (1.0, 1.0)]);
        for t in &turns {
            assert!(t
                .operations
                .iter()
                .all(|op| !op.fraction.is_one()));
        }
    }

    #[test]
    fn spikes_are_discarded() {
        // A square with a spike sticking out of its top edge to (1, 3), crossing B.
        let a: Ring = [
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 2.0),
            (1.0, 2.0),
            (1.0, 3.0),
            (1.0, 2.0),
            (0.0, 2.0),
        ]
        .into_iter()
        .collect();
        let a = prepared(&Polygon::new(a, vec![]).into(), 0);
        let b = prepared(&square(0.5, 3.0, 1.5, 4.0).into(), 1);
        let turns = get_turns(&[a, b], &Strategy::exact()).unwrap();
        assert_eq!(turns.len(), 1);
        assert!(turns[0].spike);
        assert!(turns[0].discarded);
    }

    #[test]
    fn valid_polygon_has_no_crossing_self_turns() {
        let mut p = square(0.0, 0.0, 10.0, 10.0);
        // A hole touching the exterior at one point.
        p.interiors.push(
            [(0.0, 5.0), (5.0, 4.0), (5.0, 6.0)]
                .into_iter()
                .collect(),
        );
        let turns = self_turns(&p.into(), RobustnessPolicy::Rescale).unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].method, Method::TouchInterior);
    }

    #[test]
    fn bow_tie_self_crosses() {
        let bow_tie: Ring = [(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]
            .into_iter()
            .collect();
        // The two halves have opposite orientations, so the signed area is zero.
        let shifted: Ring = [(0.0, 0.0), (2.0, 2.0), (3.0, 0.0), (0.0, 3.0)]
            .into_iter()
            .collect();
        assert!(self_turns(&Polygon::new(bow_tie, vec![]).into(), RobustnessPolicy::Exact).is_err());
        let turns = self_turns(&Polygon::new(shifted, vec![]).into(), RobustnessPolicy::Exact).unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].method, Method::Crosses);
        assert_eq!(turns[0].point, Point::new(1.5, 1.5));
    }
}
