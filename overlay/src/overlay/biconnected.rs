//! Biconnected components of the turn graph.
//!
//! The graph has a vertex for every node (lone turn or cluster) and an edge
//! for every stretch of ring between consecutive turns. A ring that leaves a
//! node and comes straight back to it would be a self-loop; we split those
//! with an extra vertex so that the loop becomes a component of its own.
//!
//! Traversal uses the component ids to break ties: when several collinear
//! edges are candidates, it prefers staying in the component it arrived from.

use std::collections::BTreeMap;

use crate::error::{OverlayError, Result};

use super::{
    cluster::{Cluster, NodeId, Nodes},
    turns::{Turn, TurnIdx},
};

struct Graph {
    // For each vertex, its (neighbor, edge) pairs.
    adjacency: Vec<Vec<(usize, usize)>>,
    edge_count: usize,
}

impl Graph {
    fn new(vertex_count: usize) -> Self {
        Graph {
            adjacency: vec![Vec::new(); vertex_count],
            edge_count: 0,
        }
    }

    fn add_vertex(&mut self) -> usize {
        self.adjacency.push(Vec::new());
        self.adjacency.len() - 1
    }

    fn add_edge(&mut self, a: usize, b: usize) -> usize {
        let e = self.edge_count;
        self.edge_count += 1;
        self.adjacency[a].push((b, e));
        self.adjacency[b].push((a, e));
        e
    }

    /// Assigns a component id to every edge (Hopcroft-Tarjan, without recursion).
    fn edge_components(&self) -> Result<Vec<Option<usize>>> {
        let n = self.adjacency.len();
        let mut discovered: Vec<Option<usize>> = vec![None; n];
        let mut low = vec![0; n];
        let mut component = vec![None; self.edge_count];
        let mut edge_stack: Vec<usize> = Vec::new();
        let mut time = 0;
        let mut next_component = 0;

        for root in 0..n {
            if discovered[root].is_some() {
                continue;
            }
            discovered[root] = Some(time);
            low[root] = time;
            time += 1;
            // (vertex, edge we arrived along, next adjacency index to look at)
            let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];

            while let Some(frame) = stack.last_mut() {
                let (v, parent_edge, i) = *frame;
                let disc_v = discovered[v].unwrap_or(0);
                if let Some(&(w, e)) = self.adjacency[v].get(i) {
                    frame.2 += 1;
                    if Some(e) == parent_edge {
                        continue;
                    }
                    match discovered[w] {
                        None => {
                            edge_stack.push(e);
                            discovered[w] = Some(time);
                            low[w] = time;
                            time += 1;
                            stack.push((w, Some(e), 0));
                        }
                        Some(disc_w) if disc_w < disc_v => {
                            // A back edge.
                            edge_stack.push(e);
                            low[v] = low[v].min(disc_w);
                        }
                        // An edge to a descendant, which was seen from the other end.
                        Some(_) => {}
                    }
                    continue;
                }

                stack.pop();
                let Some(&(u, _, _)) = stack.last() else {
                    continue;
                };
                low[u] = low[u].min(low[v]);
                let disc_u = discovered[u].unwrap_or(0);
                if low[v] >= disc_u {
                    // u separates v's subtree: everything pushed since the tree edge is one component.
                    let Some(tree_edge) = parent_edge else {
                        return Err(OverlayError::Consistency(
                            "non-root vertex without a parent edge".to_owned(),
                        ));
                    };
                    loop {
                        let Some(e) = edge_stack.pop() else {
                            return Err(OverlayError::Consistency(
                                "edge stack exhausted while closing a component".to_owned(),
                            ));
                        };
                        component[e] = Some(next_component);
                        if e == tree_edge {
                            break;
                        }
                    }
                    next_component += 1;
                }
            }
        }
        Ok(component)
    }
}

/// Computes the biconnected components of the turn graph, and stores them in
/// the `component_id` of every operation.
///
/// Needs enrichment. Returns the number of components.
pub(crate) fn detect_biconnected_components(
    turns: &mut [Turn],
    clusters: &[Cluster],
) -> Result<usize> {
    let (assignments, count) = {
        let nodes = Nodes::new(turns, clusters);
        let all = nodes.all();
        let vertex_of: BTreeMap<NodeId, usize> =
            all.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        let vertex = |node: NodeId| {
            vertex_of.get(&node).copied().ok_or_else(|| {
                OverlayError::Consistency(format!("{node:?} is not a vertex of the turn graph"))
            })
        };

        let mut graph = Graph::new(all.len());
        // Edges, keyed by the ring position they leave from.
        let mut edge_ops: Vec<(Vec<usize>, Vec<(TurnIdx, usize)>)> = Vec::new();
        let mut by_position: BTreeMap<_, usize> = BTreeMap::new();
        for (idx, turn) in turns.iter().enumerate() {
            if turn.discarded {
                continue;
            }
            for (i, op) in turn.operations.iter().enumerate() {
                let Some(to) = op.enriched.travels_to_ip_index else {
                    continue;
                };
                let (ring, seg, fraction) = op.position();
                let key = (ring, seg, fraction.clone());
                if let Some(&k) = by_position.get(&key) {
                    edge_ops[k].1.push((TurnIdx(idx), i));
                    continue;
                }

                let a = vertex(nodes.of(TurnIdx(idx)))?;
                let b = vertex(nodes.of(to))?;
                let edges = if a == b {
                    let extra = graph.add_vertex();
                    vec![graph.add_edge(a, extra), graph.add_edge(extra, b)]
                } else {
                    vec![graph.add_edge(a, b)]
                };
                by_position.insert(key, edge_ops.len());
                edge_ops.push((edges, vec![(TurnIdx(idx), i)]));
            }
        }

        let components = graph.edge_components()?;
        let count = components.iter().flatten().max().map_or(0, |c| c + 1);
        let assignments: Vec<(TurnIdx, usize, Option<usize>)> = edge_ops
            .into_iter()
            .flat_map(|(edges, ops)| {
                let c = edges.first().and_then(|e| components[*e]);
                ops.into_iter().map(move |(t, i)| (t, i, c))
            })
            .collect();
        (assignments, count)
    };

    for (t, i, c) in assignments {
        turns[t.0].operations[i].enriched.component_id = c;
    }
    tracing::debug!(count, "biconnected components");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(vertex_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
        let mut g = Graph::new(vertex_count);
        for &(a, b) in edges {
            g.add_edge(a, b);
        }
        g.edge_components()
            .unwrap()
            .into_iter()
            .map(|c| c.unwrap())
            .collect()
    }

    #[test]
    fn two_triangles_sharing_a_vertex() {
        let c = components(5, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 2)]);
        assert_eq!(c[0], c[1]);
        assert_eq!(c[1], c[2]);
        assert_eq!(c[3], c[4]);
        assert_eq!(c[4], c[5]);
        assert_ne!(c[0], c[3]);
    }

    #[test]
    fn parallel_edges_form_a_cycle() {
        // Two nodes joined by two ring stretches, and a bridge to a third node.
        let c = components(3, &[(0, 1), (1, 0), (1, 2)]);
        assert_eq!(c[0], c[1]);
        assert_ne!(c[0], c[2]);
    }

    #[test]
    fn separate_graphs() {
        let c = components(4, &[(0, 1), (2, 3)]);
        assert_ne!(c[0], c[1]);
    }

    #[test]
    fn self_loops_get_their_own_component() {
        use crate::{
            geom::tests::square,
            overlay::{
                classify::classify_turns, cluster::cluster_turns, enrich::enrich_turns,
                prepare::prepare, turns::get_turns, OverlayType,
            },
            strategy::Strategy,
        };

        // Two squares touching at one corner: both rings leave the turn and come back to it.
        let s = Strategy::exact();
        let geoms = [
            prepare(&square(0.0, 0.0, 1.0, 1.0).into(), 0, false, &s).unwrap(),
            prepare(&square(1.0, 1.0, 2.0, 2.0).into(), 1, false, &s).unwrap(),
        ];
        let mut turns = get_turns(&geoms, &s).unwrap();
        let clusters = cluster_turns(&mut turns, 0.0);
        classify_turns(&mut turns, &clusters, &geoms, [false, false], &s);
        enrich_turns(&mut turns, &clusters, &geoms, OverlayType::Union);

        assert_eq!(detect_biconnected_components(&mut turns, &clusters).unwrap(), 2);
        let [a, b] = &turns[0].operations;
        assert!(a.enriched.component_id.is_some());
        assert_ne!(a.enriched.component_id, b.enriched.component_id);
    }
}
