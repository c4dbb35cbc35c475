//! Sort-by-side: ranking the edges around a turn by angle.
//!
//! Every ring pass through a node contributes two directions: the way it came
//! from (incoming) and the way it leaves (outgoing). We sort these
//! counter-clockwise starting from a reference direction, giving each a
//! unique `rank` and a `main_rank` that is shared by collinear directions.
//! The `main_rank`s cut the neighborhood of the node into sectors, and sector
//! `k` is the one between main rank `k` and main rank `k + 1`.
//!
//! Each pass covers the sectors running counter-clockwise from its outgoing
//! direction to its incoming one (the interior is on the left). From that we
//! know, for every sector, which geometries cover it.

use std::cmp::Ordering;

use crate::{
    geom::Point,
    strategy::{Side, Strategy},
};

use super::turns::TurnIdx;

/// Whether a direction is where a ring pass came from, or where it goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DirectionKind {
    /// Pointing back at where the pass came from.
    Incoming,
    /// Pointing at where the pass goes next.
    Outgoing,
}

/// One direction out of a node.
#[derive(Clone, Debug, PartialEq)]
pub struct RankedDirection {
    /// A point (in robust space) that the direction points at.
    pub target: Point,
    /// Incoming or outgoing.
    pub kind: DirectionKind,
    /// Which geometry the pass belongs to.
    pub source_index: usize,
    /// Which pass of the node this direction belongs to.
    pub pass: usize,
    /// The turn (and operation within the turn) that this direction came from.
    pub turn: TurnIdx,
    /// See `turn`.
    pub op: usize,
    /// The unique rank of this direction.
    pub rank: usize,
    /// The rank of this direction's group of collinear directions.
    pub main_rank: usize,
    /// How many geometries cover the sector to the left of this direction.
    pub count_left: usize,
    /// How many geometries cover the sector to the right of this direction.
    pub count_right: usize,
}

/// Sorts and ranks the directions around one node.
#[derive(Clone, Debug)]
pub struct SideSorter {
    origin: Point,
    directions: Vec<RankedDirection>,
    group_count: usize,
    // For each sector, is it covered by geometry 0 and geometry 1?
    coverage: Vec<[bool; 2]>,
}

impl SideSorter {
    /// Creates an empty sorter for the node at `origin` (in robust space).
    pub fn new(origin: Point) -> Self {
        SideSorter {
            origin,
            directions: Vec::new(),
            group_count: 0,
            coverage: Vec::new(),
        }
    }

    /// Adds a direction.
    ///
    /// Every pass must end up with exactly one incoming and one outgoing direction.
    pub fn add(
        &mut self,
        target: Point,
        kind: DirectionKind,
        source_index: usize,
        pass: usize,
        turn: TurnIdx,
        op: usize,
    ) {
        self.directions.push(RankedDirection {
            target,
            kind,
            source_index,
            pass,
            turn,
            op,
            rank: 0,
            main_rank: 0,
            count_left: 0,
            count_right: 0,
        });
    }

    /// The directions, in rank order (once `apply` has been called).
    pub fn directions(&self) -> &[RankedDirection] {
        &self.directions
    }

    /// The number of distinct main ranks (and of sectors).
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// Which half-plane (relative to `reference`) `target` is in.
    ///
    /// 0 is straight along the reference, 1 is the open left half-plane, 2 is
    /// straight opposite, and 3 is the open right half-plane.
    fn half(&self, reference: &Point, target: &Point, strategy: &Strategy) -> u8 {
        match strategy.side(&self.origin, reference, target) {
            Side::Left => 1,
            Side::Right => 3,
            Side::Collinear if strategy.same_direction(&self.origin, reference, target) => 0,
            Side::Collinear => 2,
        }
    }

    fn angle_cmp(&self, reference: &Point, a: &Point, b: &Point, strategy: &Strategy) -> Ordering {
        let (ha, hb) = (
            self.half(reference, a, strategy),
            self.half(reference, b, strategy),
        );
        ha.cmp(&hb).then_with(|| {
            if ha % 2 == 0 {
                return Ordering::Equal;
            }
            // Within an open half-plane, counter-clockwise order is a total order.
            match strategy.side(&self.origin, a, b) {
                Side::Left => Ordering::Less,
                Side::Right => Ordering::Greater,
                Side::Collinear => Ordering::Equal,
            }
        })
    }

    /// Sorts the directions counter-clockwise starting at `reference`, assigns
    /// ranks, and works out which geometries cover each sector.
    ///
    /// `reversed_sources[i]` says whether geometry `i` was reversed (for
    /// difference), in which case it covers a sector only if all of its passes do.
    pub fn apply(&mut self, reference: &Point, reversed_sources: [bool; 2], strategy: &Strategy) {
        let mut dirs = std::mem::take(&mut self.directions);
        dirs.sort_by(|a, b| {
            self.angle_cmp(reference, &a.target, &b.target, strategy)
                .then(a.kind.cmp(&b.kind))
                .then(a.turn.cmp(&b.turn))
                .then(a.op.cmp(&b.op))
        });

        let mut main_rank = 0;
        for i in 0..dirs.len() {
            if i > 0
                && self.angle_cmp(reference, &dirs[i - 1].target, &dirs[i].target, strategy)
                    != Ordering::Equal
            {
                main_rank += 1;
            }
            dirs[i].rank = i;
            dirs[i].main_rank = main_rank;
        }
        self.group_count = if dirs.is_empty() { 0 } else { main_rank + 1 };
        self.directions = dirs;
        self.compute_coverage(reversed_sources);
    }

    /// The main ranks of the (incoming, outgoing) directions of each pass.
    fn pass_ranks(&self) -> Vec<(usize, Option<usize>, Option<usize>)> {
        let mut ret: Vec<(usize, Option<usize>, Option<usize>)> = Vec::new();
        for d in &self.directions {
            let entry = match ret.iter_mut().find(|(p, _, _)| *p == d.pass) {
                Some(e) => e,
                None => {
                    ret.push((d.pass, None, None));
                    // unwrap: we just pushed.
                    ret.last_mut().unwrap()
                }
            };
            match d.kind {
                DirectionKind::Incoming => entry.1 = Some(d.main_rank),
                DirectionKind::Outgoing => entry.2 = Some(d.main_rank),
            }
        }
        ret
    }

    fn compute_coverage(&mut self, reversed_sources: [bool; 2]) {
        let g = self.group_count;
        // For each geometry: how many of its passes cover each sector, and how many passes it has.
        let mut hits = vec![[0usize; 2]; g];
        let mut passes = [0usize; 2];
        let sources: Vec<(usize, usize)> = self
            .directions
            .iter()
            .map(|d| (d.pass, d.source_index))
            .collect();
        for (pass, back, out) in self.pass_ranks() {
            let Some(source) = sources.iter().find(|(p, _)| *p == pass).map(|(_, s)| *s) else {
                continue;
            };
            let (Some(back), Some(out)) = (back, out) else {
                continue;
            };
            passes[source] += 1;
            let mut sector = out;
            while sector != back {
                hits[sector][source] += 1;
                sector = (sector + 1) % g;
            }
        }

        self.coverage = hits
            .iter()
            .map(|h| {
                let covered = |s: usize| {
                    if reversed_sources[s] {
                        passes[s] > 0 && h[s] == passes[s]
                    } else {
                        h[s] > 0
                    }
                };
                [covered(0), covered(1)]
            })
            .collect();

        for d in &mut self.directions {
            let left = self.coverage[d.main_rank];
            let right = self.coverage[(d.main_rank + g - 1) % g];
            d.count_left = left.iter().filter(|c| **c).count();
            d.count_right = right.iter().filter(|c| **c).count();
        }
    }

    /// Which geometries cover sector `k` (between main ranks `k` and `k + 1`)?
    pub fn coverage(&self, sector: usize) -> [bool; 2] {
        self.coverage[sector % self.group_count.max(1)]
    }

    /// The index of the first outgoing direction with nothing covering the
    /// sector on its right: a good place to start walking the outline of a
    /// union.
    pub fn first_open_index(&self) -> Option<usize> {
        self.directions
            .iter()
            .position(|d| d.kind == DirectionKind::Outgoing && d.count_right == 0)
    }

    /// Finds the direction of a given pass and kind.
    pub fn find(&self, pass: usize, kind: DirectionKind) -> Option<&RankedDirection> {
        self.directions
            .iter()
            .find(|d| d.pass == pass && d.kind == kind)
    }

    /// Mirrors the ranking, so that ranks go clockwise from the reference direction.
    ///
    /// The reference group keeps main rank 0. Reversing twice gives back the
    /// original ranking.
    pub fn reverse(&mut self) {
        let g = self.group_count;
        if g == 0 {
            return;
        }
        for d in &mut self.directions {
            d.main_rank = (g - d.main_rank) % g;
            std::mem::swap(&mut d.count_left, &mut d.count_right);
        }
        self.directions.sort_by(|a, b| {
            a.main_rank
                .cmp(&b.main_rank)
                .then(a.kind.cmp(&b.kind))
                .then(a.turn.cmp(&b.turn))
                .then(a.op.cmp(&b.op))
        });
        for (i, d) in self.directions.iter_mut().enumerate() {
            d.rank = i;
        }
        // Sector j (clockwise) lies between reversed groups j and j + 1.
        let old = std::mem::take(&mut self.coverage);
        self.coverage = (0..g).map(|j| old[(2 * g - j - 1) % g]).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    // The corner (1, 0) where square A = [0, 1]^2 meets square B = [1, 2] x [0, 1].
    fn shared_corner() -> SideSorter {
        let mut s = SideSorter::new(p(1.0, 0.0));
        // A comes from (0, 0) and leaves to (1, 1).
        s.add(p(0.0, 0.0), DirectionKind::Incoming, 0, 0, TurnIdx(0), 0);
        s.add(p(1.0, 1.0), DirectionKind::Outgoing, 0, 0, TurnIdx(0), 0);
        // B comes from (1, 1) and leaves to (2, 0).
        s.add(p(1.0, 1.0), DirectionKind::Incoming, 1, 1, TurnIdx(0), 1);
        s.add(p(2.0, 0.0), DirectionKind::Outgoing, 1, 1, TurnIdx(0), 1);
        s.apply(&p(0.0, 0.0), [false, false], &Strategy::exact());
        s
    }

    #[test]
    fn ranks() {
        let s = shared_corner();
        let d = s.directions();
        assert_eq!(s.group_count(), 3);
        assert_eq!(d[0].target, p(0.0, 0.0));
        assert_eq!(d[1].target, p(2.0, 0.0));
        // The collinear pair shares a main rank, incoming first.
        assert_eq!(d[2].kind, DirectionKind::Incoming);
        assert_eq!(d[3].kind, DirectionKind::Outgoing);
        assert_eq!(
            d.iter().map(|d| d.main_rank).collect::<Vec<_>>(),
            vec![0, 1, 2, 2]
        );
        assert_eq!(
            d.iter().map(|d| d.rank).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn coverage_and_counts() {
        let s = shared_corner();
        // Below the corner: nothing. Upper right: B. Upper left: A.
        assert_eq!(s.coverage(0), [false, false]);
        assert_eq!(s.coverage(1), [false, true]);
        assert_eq!(s.coverage(2), [true, false]);

        let b_out = s.find(1, DirectionKind::Outgoing).unwrap();
        assert_eq!((b_out.count_left, b_out.count_right), (1, 0));
        let a_out = s.find(0, DirectionKind::Outgoing).unwrap();
        assert_eq!((a_out.count_left, a_out.count_right), (1, 1));
        assert_eq!(s.first_open_index(), Some(1));
    }

    #[test]
    fn reversed_geometry_covers_the_complement() {
        let mut s = SideSorter::new(p(1.0, 0.0));
        s.add(p(0.0, 0.0), DirectionKind::Incoming, 0, 0, TurnIdx(0), 0);
        s.add(p(1.0, 1.0), DirectionKind::Outgoing, 0, 0, TurnIdx(0), 0);
        // B, reversed: comes from (2, 0) and leaves to (1, 1).
        s.add(p(2.0, 0.0), DirectionKind::Incoming, 1, 1, TurnIdx(0), 1);
        s.add(p(1.0, 1.0), DirectionKind::Outgoing, 1, 1, TurnIdx(0), 1);
        s.apply(&p(0.0, 0.0), [false, true], &Strategy::exact());
        assert_eq!(s.coverage(0), [false, true]);
        assert_eq!(s.coverage(1), [false, false]);
        assert_eq!(s.coverage(2), [true, true]);
    }

    #[test]
    fn reverse_mirrors() {
        let mut s = shared_corner();
        let before = s.clone();
        s.reverse();
        let d = s.directions();
        assert_eq!(d[0].target, p(0.0, 0.0));
        assert_eq!(d[0].main_rank, 0);
        // Clockwise from west: north comes before east.
        assert_eq!(d[1].target, p(1.0, 1.0));
        assert_eq!(d[1].main_rank, 1);
        assert_eq!(d[3].target, p(2.0, 0.0));
        assert_eq!(d[3].main_rank, 2);
        // Clockwise sector 0 is between west and north, which is covered by A.
        assert_eq!(s.coverage(0), [true, false]);

        s.reverse();
        assert_eq!(s.directions(), before.directions());
        assert_eq!(s.coverage(1), before.coverage(1));
    }
}
