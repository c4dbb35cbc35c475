//! Traversal: walking the turn graph to produce the output rings.
//!
//! Starting from any selectable operation that hasn't been used yet, we walk
//! forward along its ring to the next turn, copying the ring's vertices on
//! the way. At the turn we pick the outgoing edge to continue along, and so on
//! until we're back where we started.
//!
//! When there's a choice, we take the first selectable edge clockwise from
//! the edge we arrived along. That keeps the output's interior on the left and
//! gives the smallest possible rings, so two rings that only touch at a point
//! come out separately. The exception is a u/u touch that survived
//! [`handle_touch`](super::touch::handle_touch): there we switch to the other
//! ring.

use crate::{
    error::{OverlayError, Result},
    geom::Point,
    strategy::Strategy,
};

use super::{
    classify::NodeView,
    cluster::{Cluster, NodeId, Nodes},
    enrich::vertices_between,
    prepare::PreparedGeometry,
    side_sorter::DirectionKind,
    turns::{Operation, Turn, TurnIdx},
    OverlayType,
};

fn consistency(msg: impl Into<String>) -> OverlayError {
    OverlayError::Consistency(msg.into())
}

pub(crate) struct Traversal<'a> {
    turns: &'a [Turn],
    nodes: Nodes<'a>,
    geometries: &'a [PreparedGeometry; 2],
    overlay: OverlayType,
    reversed_sources: [bool; 2],
    strategy: &'a Strategy,
    visited: Vec<[bool; 2]>,
}

impl<'a> Traversal<'a> {
    pub fn new(
        turns: &'a [Turn],
        clusters: &'a [Cluster],
        geometries: &'a [PreparedGeometry; 2],
        overlay: OverlayType,
        reversed_sources: [bool; 2],
        strategy: &'a Strategy,
    ) -> Self {
        Traversal {
            turns,
            nodes: Nodes::new(turns, clusters),
            geometries,
            overlay,
            reversed_sources,
            strategy,
            visited: vec![[false; 2]; turns.len()],
        }
    }

    fn view(&self, node: NodeId) -> NodeView {
        NodeView::build(
            &self.nodes,
            node,
            self.geometries,
            self.reversed_sources,
            self.strategy,
        )
    }

    fn selectable(&self, t: TurnIdx, i: usize) -> bool {
        let turn = &self.turns[t.0];
        !turn.discarded && self.overlay.selects(turn.operations[i].operation)
    }

    fn pass_selectable(&self, view: &NodeView, pass: usize) -> bool {
        view.passes[pass]
            .ops
            .iter()
            .any(|&(t, i)| self.selectable(t, i))
    }

    fn pass_operation(&self, view: &NodeView, pass: usize) -> Operation {
        let (t, i) = view.passes[pass].ops[0];
        self.turns[t.0].operations[i].operation
    }

    /// The passes that get used up together with `pass`: the pass itself,
    /// and, if it continues along the other geometry, the passes running
    /// along with it.
    fn pass_group(&self, view: &NodeView, pass: usize) -> Vec<usize> {
        if self.pass_operation(view, pass) != Operation::Continue {
            return vec![pass];
        }
        let rank = view.out_rank(pass);
        (0..view.passes.len())
            .filter(|&p| {
                p == pass
                    || (self.pass_operation(view, p) == Operation::Continue
                        && view.out_rank(p) == rank)
            })
            .collect()
    }

    fn is_visited(&self, view: &NodeView, pass: usize) -> bool {
        view.passes[pass]
            .ops
            .iter()
            .any(|&(t, i)| self.visited[t.0][i])
    }

    fn mark(&mut self, view: &NodeView, pass: usize) {
        for p in self.pass_group(view, pass) {
            for &(t, i) in &view.passes[p].ops {
                self.visited[t.0][i] = true;
            }
        }
    }

    /// At a u/u touch that connects its two rings, two result edges arrive;
    /// each continues along the other ring.
    fn select_by_incoming(
        &self,
        view: &NodeView,
        arrival: usize,
        count_left_incoming: usize,
        candidates: &[usize],
    ) -> Option<usize> {
        let NodeId::Turn(t) = view.node else {
            return None;
        };
        if self.overlay != OverlayType::Union
            || count_left_incoming < 2
            || !self.turns[t.0].is_uu_touch()
        {
            return None;
        }
        let arrival_source = view.passes[arrival].source_index();
        candidates
            .iter()
            .copied()
            .find(|&p| view.passes[p].source_index() != arrival_source)
    }

    /// Picks the pass to leave a node along, having arrived along `arrival`.
    fn select_next(
        &self,
        view: &NodeView,
        arrival: usize,
        arrival_op: (TurnIdx, usize),
    ) -> Result<usize> {
        let candidates: Vec<usize> = (0..view.passes.len())
            .filter(|&p| self.pass_selectable(view, p))
            .collect();
        match candidates.as_slice() {
            [] => {
                return Err(consistency(format!(
                    "no usable outgoing edge at {:?}",
                    view.node
                )))
            }
            [only] => return Ok(*only),
            _ => {}
        }

        let (t, i) = arrival_op;
        let enriched = &self.turns[t.0].operations[i].enriched;
        if let Some(p) =
            self.select_by_incoming(view, arrival, enriched.count_left_incoming, &candidates)
        {
            return Ok(p);
        }

        let mut sorter = view.sorter.clone();
        sorter.reverse();
        let g = sorter.group_count();
        let back = sorter
            .find(arrival, DirectionKind::Incoming)
            .ok_or_else(|| consistency("arrival has no incoming direction"))?
            .main_rank;
        let clockwise_distance = |p: usize| {
            let m = sorter
                .find(p, DirectionKind::Outgoing)
                .map_or(back, |d| d.main_rank);
            // Going straight back where we came from is the last resort.
            match (m + g - back) % g {
                0 => g,
                d => d,
            }
        };
        let component = |p: usize| {
            let (t, i) = view.passes[p].ops[0];
            self.turns[t.0].operations[i].enriched.component_id
        };

        candidates
            .iter()
            .copied()
            .min_by_key(|&p| {
                (
                    clockwise_distance(p),
                    component(p) != enriched.component_id,
                    view.passes[p].source_index(),
                    p,
                )
            })
            .ok_or_else(|| consistency("no candidate survived ranking"))
    }

    fn traverse_ring(&mut self, start_view: &NodeView, start_pass: usize) -> Result<Vec<Point>> {
        let start_node = start_view.node;
        let start_group = self.pass_group(start_view, start_pass);
        self.mark(start_view, start_pass);

        let mut points = vec![self.nodes.point(start_node)];
        let mut current = start_view.passes[start_pass].ops[0];
        let limit = 2 * self.turns.len() + 1;

        for _ in 0..limit {
            let (t, i) = current;
            let op = &self.turns[t.0].operations[i];
            let to = op
                .enriched
                .travels_to_ip_index
                .ok_or_else(|| consistency(format!("{t:?} doesn't go anywhere")))?;
            let target = &self.turns[to.0].operations[i];
            let ring_id = op.seg_id.ring();
            let ring = self.geometries[ring_id.source_index]
                .ring(&ring_id)
                .ok_or_else(|| consistency(format!("unknown ring {ring_id:?}")))?;

            points.extend(
                vertices_between(
                    ring.len(),
                    (op.seg_id.segment_index, &op.fraction),
                    (target.seg_id.segment_index, &target.fraction),
                )
                .map(|v| ring.vertex(v).point),
            );

            let node = self.nodes.of(to);
            points.push(self.nodes.point(node));

            let view = self.view(node);
            let arrival = view
                .pass_of(to, i)
                .ok_or_else(|| consistency(format!("{to:?} lost its ring pass")))?;
            let next = self.select_next(&view, arrival, current)?;

            if node == start_node && start_group.contains(&next) {
                return Ok(points);
            }
            if self.is_visited(&view, next) {
                return Err(consistency(format!(
                    "revisited {node:?} without getting back to {start_node:?}"
                )));
            }
            self.mark(&view, next);
            current = view.passes[next].ops[0];
        }
        Err(consistency(format!(
            "ring starting at {start_node:?} didn't close"
        )))
    }

    /// Walks every selectable edge, returning the closed rings.
    pub fn traverse(&mut self) -> Result<Vec<Vec<Point>>> {
        let mut rings = Vec::new();
        for t in (0..self.turns.len()).map(TurnIdx) {
            for i in 0..2 {
                // Starting along the outline of a cluster may walk a ring
                // that misses this operation, so keep going until it's used.
                while !self.visited[t.0][i] && self.selectable(t, i) {
                    let view = self.view(self.nodes.of(t));
                    let Some(pass) = view.pass_of(t, i) else {
                        break;
                    };
                    // In a cluster, prefer starting along the outline.
                    let start = match view.node {
                        NodeId::Cluster(_) => view
                            .sorter
                            .first_open_index()
                            .map(|d| view.sorter.directions()[d].pass)
                            .filter(|&p| {
                                self.pass_selectable(&view, p) && !self.is_visited(&view, p)
                            })
                            .unwrap_or(pass),
                        NodeId::Turn(_) => pass,
                    };
                    let ring = self.traverse_ring(&view, start)?;
                    tracing::trace!(start = ?view.node, len = ring.len(), "traversed ring");
                    rings.push(ring);
                }
            }
        }
        tracing::debug!(count = rings.len(), "traversed rings");
        Ok(rings)
    }
}
