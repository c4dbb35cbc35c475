//! Enrichment: linking each turn operation to where its ring goes next.

use std::collections::BTreeMap;

use crate::num::SegmentRatio;

use super::{
    cluster::{Cluster, NodeId, Nodes},
    prepare::PreparedGeometry,
    turns::{EnrichmentInfo, RingId, Turn, TurnIdx},
    OverlayType,
};

/// An operation's place along its ring.
#[derive(Clone, Debug)]
struct Position {
    segment_index: usize,
    fraction: SegmentRatio,
    turn: TurnIdx,
    op: usize,
}

impl Position {
    fn same_place(&self, other: &Position) -> bool {
        self.segment_index == other.segment_index && self.fraction == other.fraction
    }
}

/// The indices of the ring vertices strictly between two positions on the
/// ring, walking forwards from `from` to `to`.
///
/// If `to` isn't ahead of `from`, the walk wraps around the ring. In
/// particular, walking from a position to itself passes every vertex.
pub(crate) fn vertices_between(
    ring_len: usize,
    from: (usize, &SegmentRatio),
    to: (usize, &SegmentRatio),
) -> impl Iterator<Item = usize> {
    let (from_seg, _) = from;
    let (to_seg, to_fraction) = to;
    let to_seg = if to <= from { to_seg + ring_len } else { to_seg };
    // A position at the start of a segment is the vertex itself.
    let last = if to_fraction.is_zero() { to_seg - 1 } else { to_seg };
    ((from_seg + 1)..=last).map(move |v| v % ring_len)
}

/// Fills in the [`EnrichmentInfo`] of every operation of every turn.
///
/// Discarded turns get empty enrichment, and are skipped over by the others.
pub(crate) fn enrich_turns(
    turns: &mut [Turn],
    clusters: &[Cluster],
    geometries: &[PreparedGeometry; 2],
    overlay: OverlayType,
) {
    let mut by_ring: BTreeMap<RingId, Vec<Position>> = BTreeMap::new();
    for (idx, turn) in turns.iter_mut().enumerate() {
        for (i, op) in turn.operations.iter_mut().enumerate() {
            op.enriched = EnrichmentInfo {
                component_id: op.enriched.component_id,
                ..EnrichmentInfo::default()
            };
            if !turn.discarded {
                by_ring.entry(op.seg_id.ring()).or_default().push(Position {
                    segment_index: op.seg_id.segment_index,
                    fraction: op.fraction.clone(),
                    turn: TurnIdx(idx),
                    op: i,
                });
            }
        }
    }

    // The first operation of every distinct ring position, and where it goes.
    let mut edges: Vec<(TurnIdx, usize, TurnIdx)> = Vec::new();
    for (ring_id, mut positions) in by_ring {
        let Some(ring) = geometries[ring_id.source_index].ring(&ring_id) else {
            continue;
        };
        let n = ring.len();
        positions.sort_by(|a, b| {
            (a.segment_index, &a.fraction, a.turn, a.op).cmp(&(
                b.segment_index,
                &b.fraction,
                b.turn,
                b.op,
            ))
        });
        let groups: Vec<&[Position]> = positions.chunk_by(|a, b| a.same_place(b)).collect();
        for (k, group) in groups.iter().enumerate() {
            let next = &groups[(k + 1) % groups.len()][0];
            let next_on_segment = k + 1 < groups.len() && next.segment_index == group[0].segment_index;
            for pos in *group {
                let e = &mut turns[pos.turn.0].operations[pos.op].enriched;
                e.travels_to_ip_index = Some(next.turn);
                e.travels_to_vertex_index = Some((pos.segment_index + 1) % n);
                e.next_ip_index = next_on_segment.then_some(next.turn);
            }
            edges.push((group[0].turn, group[0].op, next.turn));
        }
    }

    let mut incoming: BTreeMap<NodeId, usize> = BTreeMap::new();
    let targets: Vec<(TurnIdx, usize, NodeId)> = {
        let nodes = Nodes::new(turns, clusters);
        for &(t, i, to) in &edges {
            if overlay.selects(turns[t.0].operations[i].operation) {
                *incoming.entry(nodes.of(to)).or_default() += 1;
            }
        }
        turns
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.discarded)
            .flat_map(|(idx, t)| {
                t.operations.iter().enumerate().filter_map(move |(i, op)| {
                    op.enriched
                        .travels_to_ip_index
                        .map(|to| (TurnIdx(idx), i, to))
                })
            })
            .map(|(t, i, to)| (t, i, nodes.of(to)))
            .collect()
    };
    for (t, i, node) in targets {
        turns[t.0].operations[i].enriched.count_left_incoming =
            incoming.get(&node).copied().unwrap_or(0);
    }
    tracing::debug!(edges = edges.len(), "enriched turns");
}
