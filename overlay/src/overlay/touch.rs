//! Deciding what to do with rings that only touch.
//!
//! Where two rings touch at a single point with both leaving edges on the
//! outline of the union (a "u/u touch"), the union's outline either passes
//! straight through the point twice, or it switches from one ring to the
//! other there. It switches only if the two rings are connected some other
//! way, through other union edges; otherwise the touch is discarded and each
//! ring is walked on its own.

use std::collections::{BTreeSet, VecDeque};

use super::turns::{Operation, RingId, Turn, TurnIdx};

/// Can we get from `start`, walking forwards along union edges, to a turn
/// that isn't itself a u/u touch and that involves `target`?
///
/// The search gives up after `turns.len()` expansions.
fn connected_elsewhere(turns: &[Turn], start: TurnIdx, target: RingId) -> bool {
    let mut queue = VecDeque::new();
    let mut seen = BTreeSet::new();
    let mut budget = turns.len();

    queue.extend(turns[start.0].operations[0].enriched.travels_to_ip_index);
    while let Some(t) = queue.pop_front() {
        if budget == 0 {
            tracing::debug!(?start, "touch search ran out of budget");
            return false;
        }
        budget -= 1;
        if t == start || !seen.insert(t) {
            continue;
        }

        let turn = &turns[t.0];
        if turn.discarded {
            continue;
        }
        if !turn.is_uu_touch() && turn.operations.iter().any(|op| op.seg_id.ring() == target) {
            return true;
        }
        for op in &turn.operations {
            if matches!(op.operation, Operation::Union | Operation::Continue) {
                queue.extend(op.enriched.travels_to_ip_index);
            }
        }
    }
    false
}

/// Discards the u/u touches of a union that don't connect their two rings.
///
/// Needs enrichment to have been done, and enrichment must be redone
/// afterwards if anything was discarded. Returns the number of discarded
/// turns.
pub(crate) fn handle_touch(turns: &mut [Turn]) -> usize {
    let candidates: Vec<TurnIdx> = turns
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.discarded && t.is_uu_touch())
        .map(|(idx, _)| TurnIdx(idx))
        .collect();

    let to_discard: Vec<TurnIdx> = candidates
        .into_iter()
        .filter(|&t| {
            let target = turns[t.0].operations[1].seg_id.ring();
            !connected_elsewhere(turns, t, target)
        })
        .collect();

    for t in &to_discard {
        tracing::trace!(turn = ?t, "discarding isolated u/u touch");
        turns[t.0].discarded = true;
    }
    tracing::debug!(count = to_discard.len(), "handled touches");
    to_discard.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geom::{tests::square, MultiPolygon, Polygon, Ring},
        overlay::{
            classify::classify_turns, cluster::cluster_turns, enrich::enrich_turns,
            prepare::prepare, turns::get_turns, OverlayType,
        },
        strategy::Strategy,
    };

    fn union_turns(a: MultiPolygon, b: MultiPolygon) -> Vec<Turn> {
        let s = Strategy::exact();
        let geoms = [
            prepare(&a, 0, false, &s).unwrap(),
            prepare(&b, 1, false, &s).unwrap(),
        ];
        let mut turns = get_turns(&geoms, &s).unwrap();
        let clusters = cluster_turns(&mut turns, 0.0);
        classify_turns(&mut turns, &clusters, &geoms, [false, false], &s);
        enrich_turns(&mut turns, &clusters, &geoms, OverlayType::Union);
        turns
    }

    #[test]
    fn lone_touch_is_discarded() {
        let mut turns = union_turns(
            square(0.0, 0.0, 1.0, 1.0).into(),
            square(1.0, 1.0, 2.0, 2.0).into(),
        );
        assert!(turns[0].is_uu_touch());
        assert_eq!(handle_touch(&mut turns), 1);
        assert!(turns[0].discarded);
    }

    #[test]
    fn bridged_touch_is_kept() {
        // B overlaps the right side of A, then wraps around over the top and
        // comes back down to touch A's top edge at (2, 4), enclosing a hole.
        let b: Ring = [
            (3.0, 1.0),
            (6.0, 1.0),
            (6.0, 6.0),
            (1.0, 6.0),
            (1.0, 5.0),
            (2.0, 4.0),
            (3.0, 5.0),
            (5.0, 5.0),
            (5.0, 2.0),
            (3.0, 2.0),
        ]
        .into_iter()
        .collect();
        let mut turns = union_turns(
            square(0.0, 0.0, 4.0, 4.0).into(),
            Polygon::new(b, vec![]).into(),
        );
        let touch = turns
            .iter()
            .position(|t| t.point == crate::geom::Point::new(2.0, 4.0))
            .unwrap();
        assert!(turns[touch].is_uu_touch());
        assert_eq!(handle_touch(&mut turns), 0);
        assert!(!turns[touch].discarded);
    }
}
