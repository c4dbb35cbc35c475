//! Clustering: grouping turns that sit at the same point.
//!
//! When more than two ring passes meet at one point, the segment
//! intersection engine reports one turn per pair of passes. Those turns have
//! to be handled together, because the right way to leave the point depends
//! on all the edges there. A group of coincident turns is a [`Cluster`].

use std::collections::{BTreeMap, BTreeSet};

use ordered_float::OrderedFloat;

use crate::geom::Point;

use super::turns::{ClusterIdx, RingId, Turn, TurnIdx};

/// A group of two or more coincident turns.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    /// The turns in this cluster, in increasing order.
    pub turns: Vec<TurnIdx>,
    /// The point of the cluster, in input coordinates.
    pub point: Point,
    /// The point of the cluster, in robust space.
    pub robust_point: Point,
    /// All the rings that pass through this cluster.
    pub rings: BTreeSet<RingId>,
}

/// A node of the turn graph: a lone turn, or a whole cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum NodeId {
    Turn(TurnIdx),
    Cluster(ClusterIdx),
}

/// A read-only view of the turn graph's nodes.
#[derive(Clone, Copy)]
pub(crate) struct Nodes<'a> {
    pub turns: &'a [Turn],
    pub clusters: &'a [Cluster],
}

impl<'a> Nodes<'a> {
    pub fn new(turns: &'a [Turn], clusters: &'a [Cluster]) -> Self {
        Nodes { turns, clusters }
    }

    /// The node that a turn belongs to.
    pub fn of(&self, t: TurnIdx) -> NodeId {
        match self.turns[t.0].cluster_id {
            Some(c) => NodeId::Cluster(c),
            None => NodeId::Turn(t),
        }
    }

    /// The turns making up a node.
    pub fn members(&self, node: NodeId) -> Vec<TurnIdx> {
        match node {
            NodeId::Turn(t) => vec![t],
            NodeId::Cluster(c) => self.clusters[c.0].turns.clone(),
        }
    }

    pub fn point(&self, node: NodeId) -> Point {
        match node {
            NodeId::Turn(t) => self.turns[t.0].point,
            NodeId::Cluster(c) => self.clusters[c.0].point,
        }
    }

    pub fn robust_point(&self, node: NodeId) -> Point {
        match node {
            NodeId::Turn(t) => self.turns[t.0].robust_point,
            NodeId::Cluster(c) => self.clusters[c.0].robust_point,
        }
    }

    /// All the nodes containing at least one turn that isn't discarded, in
    /// order of their first turn.
    pub fn all(&self) -> Vec<NodeId> {
        let mut seen = BTreeSet::new();
        self.turns
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.discarded)
            .map(|(idx, _)| self.of(TurnIdx(idx)))
            .filter(|node| seen.insert(*node))
            .collect()
    }
}

type GridKey = (OrderedFloat<f64>, OrderedFloat<f64>);

fn grid_key(p: &Point, tolerance: f64) -> GridKey {
    if tolerance > 0.0 {
        (
            OrderedFloat((p.x / tolerance).round()),
            OrderedFloat((p.y / tolerance).round()),
        )
    } else {
        (OrderedFloat(p.x), OrderedFloat(p.y))
    }
}

/// Groups coincident turns into clusters.
///
/// Turns are coincident if their robust points fall into the same grid cell,
/// with cells of size `tolerance`. A tolerance of zero means that robust
/// points must be exactly equal (and with a rescaling policy, they're already
/// on an integer grid).
///
/// Discarded turns are left out. Every turn's `cluster_id` is overwritten, so
/// clustering twice gives the same result as clustering once.
pub(crate) fn cluster_turns(turns: &mut [Turn], tolerance: f64) -> Vec<Cluster> {
    let mut cells: BTreeMap<GridKey, Vec<TurnIdx>> = BTreeMap::new();
    for (idx, turn) in turns.iter_mut().enumerate() {
        turn.cluster_id = None;
        if !turn.discarded {
            cells
                .entry(grid_key(&turn.robust_point, tolerance))
                .or_default()
                .push(TurnIdx(idx));
        }
    }

    let mut groups: Vec<Vec<TurnIdx>> = cells.into_values().filter(|g| g.len() > 1).collect();
    // Number the clusters by their first turn, not by their position on the grid.
    groups.sort();

    let mut clusters = Vec::with_capacity(groups.len());
    for members in groups {
        let c = ClusterIdx(clusters.len());
        let first = &turns[members[0].0];
        let (point, robust_point) = (first.point, first.robust_point);
        let mut rings = BTreeSet::new();
        for t in &members {
            let turn = &mut turns[t.0];
            turn.cluster_id = Some(c);
            rings.extend(turn.operations.iter().map(|op| op.seg_id.ring()));
        }
        tracing::trace!(cluster = ?c, turns = ?members, ?point, "cluster");
        clusters.push(Cluster {
            turns: members,
            point,
            robust_point,
            rings,
        });
    }
    tracing::debug!(count = clusters.len(), "clustered turns");
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geom::tests::square,
        overlay::{prepare::prepare, turns::get_turns},
        strategy::Strategy,
    };

    fn corner_turns() -> Vec<Turn> {
        // Two squares meeting corner to corner, plus a third ring in B passing
        // through the same corner, so that several turns land on (1, 1).
        let a = prepare(&square(0.0, 0.0, 1.0, 1.0).into(), 0, false, &Strategy::exact()).unwrap();
        let b_mp = crate::geom::MultiPolygon(vec![
            square(1.0, 1.0, 2.0, 2.0),
            square(1.0, -1.0, 3.0, 1.0),
        ]);
        let b = prepare(&b_mp, 1, false, &Strategy::exact()).unwrap();
        get_turns(&[a, b], &Strategy::exact()).unwrap()
    }

    #[test]
    fn coincident_turns_cluster() {
        let mut turns = corner_turns();
        let clusters = cluster_turns(&mut turns, 0.0);

        let at_corner: Vec<_> = turns
            .iter()
            .enumerate()
            .filter(|(_, t)| t.point == Point::new(1.0, 1.0))
            .map(|(i, _)| TurnIdx(i))
            .collect();
        assert!(at_corner.len() >= 2);

        let c = clusters
            .iter()
            .find(|c| c.point == Point::new(1.0, 1.0))
            .unwrap();
        assert_eq!(c.turns, at_corner);
        assert_eq!(c.rings.len(), 3);
        for t in &at_corner {
            assert!(turns[t.0].cluster_id.is_some());
        }
    }

    #[test]
    fn clustering_is_idempotent() {
        let mut turns = corner_turns();
        let first = cluster_turns(&mut turns, 0.0);
        let ids: Vec<_> = turns.iter().map(|t| t.cluster_id).collect();
        let second = cluster_turns(&mut turns, 0.0);
        assert_eq!(first, second);
        assert_eq!(ids, turns.iter().map(|t| t.cluster_id).collect::<Vec<_>>());
    }

    #[test]
    fn tolerance_merges_nearby_points() {
        let mut turns = corner_turns();
        let n = turns.len();
        let mut nudged = turns[0].clone();
        nudged.robust_point.x += 1e-9;
        turns.push(nudged);

        cluster_turns(&mut turns, 0.0);
        assert!(turns[n].cluster_id.is_none());

        let loose = cluster_turns(&mut turns, 1e-3);
        let c = turns[n].cluster_id.unwrap();
        assert!(loose[c.0].turns.contains(&TurnIdx(n)));
        assert!(loose[c.0].turns.contains(&TurnIdx(0)));
    }
}
