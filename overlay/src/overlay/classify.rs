//! Assigning operations to turns, using sort-by-side at every node.

use crate::{
    geom::Point,
    intersection::Method,
    num::SegmentRatio,
    strategy::Strategy,
};

use super::{
    cluster::{Cluster, NodeId, Nodes},
    prepare::{PreparedGeometry, PreparedRing},
    side_sorter::{DirectionKind, SideSorter},
    turns::{Operation, RingId, Turn, TurnIdx},
};

/// One pass of a ring through a node.
///
/// Several turns at a node can share a pass (one for every ring of the other
/// geometry passing through the same point); the pass lists all of their
/// operations.
#[derive(Clone, Debug)]
pub(crate) struct RingPass {
    pub ring: RingId,
    pub segment_index: usize,
    pub fraction: SegmentRatio,
    pub ops: Vec<(TurnIdx, usize)>,
}

impl RingPass {
    pub fn source_index(&self) -> usize {
        self.ring.source_index
    }

    pub fn contains(&self, turn: TurnIdx, op: usize) -> bool {
        self.ops.contains(&(turn, op))
    }
}

/// Groups the operations of a node's turns into ring passes, sorted by position.
pub(crate) fn gather_passes(turns: &[Turn], members: &[TurnIdx]) -> Vec<RingPass> {
    let mut passes: Vec<RingPass> = Vec::new();
    for &t in members {
        let turn = &turns[t.0];
        if turn.discarded {
            continue;
        }
        for (i, op) in turn.operations.iter().enumerate() {
            let (ring, seg, fraction) = op.position();
            match passes
                .iter_mut()
                .find(|p| p.ring == ring && p.segment_index == seg && &p.fraction == fraction)
            {
                Some(p) => p.ops.push((t, i)),
                None => passes.push(RingPass {
                    ring,
                    segment_index: seg,
                    fraction: fraction.clone(),
                    ops: vec![(t, i)],
                }),
            }
        }
    }
    passes.sort_by(|a, b| {
        (a.ring, a.segment_index, &a.fraction).cmp(&(b.ring, b.segment_index, &b.fraction))
    });
    passes
}

/// Walks along a ring from vertex `start` (forwards or backwards) until it
/// finds a vertex that isn't at `origin`.
fn first_vertex_away(ring: &PreparedRing, start: usize, forward: bool, origin: &Point) -> Option<Point> {
    let n = ring.len();
    (0..n)
        .map(|k| if forward { start + k } else { start + n - k })
        .map(|idx| ring.vertex(idx).robust)
        .find(|p| p != origin)
}

/// The robust points that a pass comes from and goes to.
pub(crate) fn pass_targets(
    pass: &RingPass,
    ring: &PreparedRing,
    origin: &Point,
) -> Option<(Point, Point)> {
    let n = ring.len();
    let seg = pass.segment_index;
    // If the pass is at a vertex, the segment before it is the one it came along.
    let back_start = if pass.fraction.is_zero() {
        (seg + n - 1) % n
    } else {
        seg
    };
    let back = first_vertex_away(ring, back_start, false, origin)?;
    let out = first_vertex_away(ring, (seg + 1) % n, true, origin)?;
    Some((back, out))
}

/// A node of the turn graph, with all its passes sorted by side.
#[derive(Clone, Debug)]
pub(crate) struct NodeView {
    pub node: NodeId,
    pub passes: Vec<RingPass>,
    pub sorter: SideSorter,
}

impl NodeView {
    pub fn build(
        nodes: &Nodes<'_>,
        node: NodeId,
        geometries: &[PreparedGeometry; 2],
        reversed_sources: [bool; 2],
        strategy: &Strategy,
    ) -> NodeView {
        let origin = nodes.robust_point(node);
        let mut passes = Vec::new();
        let mut sorter = SideSorter::new(origin);
        let mut reference = None;

        for pass in gather_passes(nodes.turns, &nodes.members(node)) {
            let Some((back, out)) = geometries[pass.source_index()]
                .ring(&pass.ring)
                .and_then(|ring| pass_targets(&pass, ring, &origin))
            else {
                tracing::warn!(?node, ring = ?pass.ring, "ring pass has no direction");
                continue;
            };
            let idx = passes.len();
            let (turn, op) = pass.ops[0];
            sorter.add(back, DirectionKind::Incoming, pass.source_index(), idx, turn, op);
            sorter.add(out, DirectionKind::Outgoing, pass.source_index(), idx, turn, op);
            reference.get_or_insert(back);
            passes.push(pass);
        }
        if let Some(reference) = reference {
            sorter.apply(&reference, reversed_sources, strategy);
        }
        NodeView {
            node,
            passes,
            sorter,
        }
    }

    /// The main rank of a pass's outgoing direction.
    pub fn out_rank(&self, pass: usize) -> Option<usize> {
        self.sorter
            .find(pass, DirectionKind::Outgoing)
            .map(|d| d.main_rank)
    }

    /// The pass containing a given operation.
    pub fn pass_of(&self, turn: TurnIdx, op: usize) -> Option<usize> {
        self.passes.iter().position(|p| p.contains(turn, op))
    }

    /// Works out the operation of a pass, from the coverage of the sectors on
    /// either side of its outgoing edge.
    pub fn operation(&self, pass: usize) -> Operation {
        let Some(m) = self.out_rank(pass) else {
            return Operation::Blocked;
        };
        let g = self.sorter.group_count();
        let left = self.sorter.coverage(m);
        let right = self.sorter.coverage(m + g - 1);
        let own = self.passes[pass].source_index();
        let other = 1 - own;

        if !left[own] || right[own] {
            return Operation::Blocked;
        }
        match (left[other], right[other]) {
            (false, false) => Operation::Union,
            (true, true) => Operation::Intersection,
            (true, false) => Operation::Continue,
            (false, true) => Operation::Opposite,
        }
    }
}

/// Assigns an operation to every operation of every turn.
///
/// Lone crossing turns were already classified from their side predicates
/// when they were found; everything else is classified by sorting its node.
pub(crate) fn classify_turns(
    turns: &mut [Turn],
    clusters: &[Cluster],
    geometries: &[PreparedGeometry; 2],
    reversed_sources: [bool; 2],
    strategy: &Strategy,
) {
    let mut assignments = Vec::new();
    {
        let nodes = Nodes::new(turns, clusters);
        for node in nodes.all() {
            if let NodeId::Turn(t) = node {
                if turns[t.0].method == Method::Crosses {
                    continue;
                }
            }
            let view = NodeView::build(&nodes, node, geometries, reversed_sources, strategy);
            for (idx, pass) in view.passes.iter().enumerate() {
                let op = view.operation(idx);
                tracing::trace!(?node, ring = ?pass.ring, ?op, "classified pass");
                assignments.extend(pass.ops.iter().map(|&(t, i)| (t, i, op)));
            }
        }
    }
    for (t, i, op) in assignments {
        turns[t.0].operations[i].operation = op;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geom::{tests::square, MultiPolygon, Point},
        overlay::{cluster::cluster_turns, prepare::prepare, turns::get_turns},
    };

    fn classified(a: MultiPolygon, b: MultiPolygon, reverse_b: bool) -> Vec<Turn> {
        let s = Strategy::exact();
        let geoms = [
            prepare(&a, 0, false, &s).unwrap(),
            prepare(&b, 1, reverse_b, &s).unwrap(),
        ];
        let mut turns = get_turns(&geoms, &s).unwrap();
        let clusters = cluster_turns(&mut turns, 0.0);
        classify_turns(&mut turns, &clusters, &geoms, [false, reverse_b], &s);
        turns
    }

    fn at(turns: &[Turn], x: f64, y: f64) -> &Turn {
        turns
            .iter()
            .find(|t| t.point == Point::new(x, y))
            .unwrap()
    }

    #[test]
    fn adjacent_squares() {
        let turns = classified(
            square(0.0, 0.0, 1.0, 1.0).into(),
            square(1.0, 0.0, 2.0, 1.0).into(),
            false,
        );
        // At the bottom of the shared edge, A goes up along it (with B going
        // the other way) while B leaves along the outline of the union.
        let t = at(&turns, 1.0, 0.0);
        assert_eq!(t.operations[0].operation, Operation::Opposite);
        assert_eq!(t.operations[1].operation, Operation::Union);

        let t = at(&turns, 1.0, 1.0);
        assert_eq!(t.operations[0].operation, Operation::Union);
        assert_eq!(t.operations[1].operation, Operation::Opposite);
    }

    #[test]
    fn hole_filled_by_a_reversed_square() {
        // A has a hole [4, 6]^2, and B is exactly the hole.
        let mut a = square(0.0, 0.0, 10.0, 10.0);
        a.interiors
            .push(crate::geom::Rect::new((4.0, 4.0), (6.0, 6.0)).to_ring());
        let b = square(4.0, 4.0, 6.0, 6.0);

        // Difference reverses B, so that it runs the same way as A's hole.
        let turns = classified(a.clone().into(), b.clone().into(), true);
        assert!(!turns.is_empty());
        let t = at(&turns, 4.0, 6.0);
        assert_eq!(t.operations[0].operation, Operation::Continue);
        assert_eq!(t.operations[1].operation, Operation::Continue);

        // Unreversed, they run in opposite directions.
        let turns = classified(a.into(), b.into(), false);
        let t = at(&turns, 4.0, 6.0);
        assert_eq!(t.operations[0].operation, Operation::Opposite);
        assert_eq!(t.operations[1].operation, Operation::Opposite);
    }

    #[test]
    fn pass_targets_skip_coincident_vertices() {
        let s = Strategy::exact();
        let g = prepare(&square(0.0, 0.0, 1.0, 1.0).into(), 0, false, &s).unwrap();
        let ring = &g.rings[0];
        let pass = RingPass {
            ring: ring.id,
            segment_index: 1,
            fraction: SegmentRatio::zero(),
            ops: vec![],
        };
        // At vertex 1 = (1, 0): from (0, 0), to (1, 1).
        assert_eq!(
            pass_targets(&pass, ring, &Point::new(1.0, 0.0)),
            Some((Point::new(0.0, 0.0), Point::new(1.0, 1.0)))
        );
    }
}
