//! Monotonic sections, the coarse spatial partition used for finding turns.
//!
//! A section is a run of consecutive segments of one ring (or linestring)
//! along which both coordinates change monotonically. Two segments can only
//! meet if their sections' boxes overlap, so we only run the segment
//! intersection engine on pairs of segments from overlapping sections.

use std::ops::Range;

use crate::{geom::Rect, intersection::Vertex};

/// Sections are capped at this many segments, so that long monotonic runs
/// don't end up with huge boxes.
const MAX_SECTION_SEGMENTS: usize = 10;

/// A monotonic run of segments.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    /// Which ring (or linestring) this section belongs to, as an index chosen by the caller.
    pub ring: usize,
    /// The segment indices in this section.
    pub segments: Range<usize>,
    /// The bounding box of the section, in robust space.
    pub envelope: Rect,
    direction: (i8, i8),
}

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Splits a ring or linestring into monotonic sections.
///
/// If `closed` is true, the segment from the last vertex back to the first is
/// included.
pub fn sectionalize(ring: usize, vertices: &[Vertex], closed: bool) -> Vec<Section> {
    let n = vertices.len();
    let segment_count = match (closed, n) {
        (_, 0 | 1) => 0,
        (true, n) => n,
        (false, n) => n - 1,
    };

    let mut ret: Vec<Section> = Vec::new();
    for seg in 0..segment_count {
        let a = &vertices[seg].robust;
        let b = &vertices[(seg + 1) % n].robust;
        let direction = (sign(b.x - a.x), sign(b.y - a.y));

        match ret.last_mut() {
            Some(sec)
                if sec.direction == direction
                    && sec.segments.end == seg
                    && sec.segments.len() < MAX_SECTION_SEGMENTS =>
            {
                sec.segments.end = seg + 1;
                sec.envelope.expand_to(b);
            }
            _ => ret.push(Section {
                ring,
                segments: seg..(seg + 1),
                envelope: Rect::new(*a, *b),
                direction,
            }),
        }
    }
    ret
}

fn by_min_x(sections: &[Section]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..sections.len()).collect();
    order.sort_by(|&i, &j| {
        sections[i]
            .envelope
            .min
            .x
            .total_cmp(&sections[j].envelope.min.x)
    });
    order
}

/// Finds all pairs `(i, j)` such that `a[i]` and `b[j]` have overlapping boxes.
///
/// This is a sweep over the boxes' left edges.
pub fn overlapping_pairs(a: &[Section], b: &[Section]) -> Vec<(usize, usize)> {
    let b_order = by_min_x(b);
    let mut ret = Vec::new();
    for (i, sec) in a.iter().enumerate() {
        for &j in &b_order {
            if b[j].envelope.min.x > sec.envelope.max.x {
                break;
            }
            if sec.envelope.intersects(&b[j].envelope) {
                ret.push((i, j));
            }
        }
    }
    ret
}

/// Finds all pairs `(i, j)` with `i <= j` such that `sections[i]` and
/// `sections[j]` have overlapping boxes. Every section overlaps itself.
pub fn self_overlapping_pairs(sections: &[Section]) -> Vec<(usize, usize)> {
    let order = by_min_x(sections);
    let mut ret = Vec::new();
    for (k, &i) in order.iter().enumerate() {
        ret.push((i, i));
        for &j in &order[(k + 1)..] {
            if sections[j].envelope.min.x > sections[i].envelope.max.x {
                break;
            }
            if sections[i].envelope.intersects(&sections[j].envelope) {
                ret.push((i.min(j), i.max(j)));
            }
        }
    }
    ret.sort_unstable();
    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertices(pts: &[(f64, f64)]) -> Vec<Vertex> {
        pts.iter().map(|&p| Vertex::exact(p.into())).collect()
    }

    #[test]
    fn square_has_four_sections() {
        let v = vertices(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let secs = sectionalize(0, &v, true);
        assert_eq!(secs.len(), 4);
        assert_eq!(secs[3].segments, 3..4);
        assert_eq!(secs[3].envelope, Rect::new((0.0, 0.0), (0.0, 1.0)));

        // As a linestring, the closing segment is missing.
        assert_eq!(sectionalize(0, &v, false).len(), 3);
    }

    #[test]
    fn monotonic_runs_merge() {
        let v = vertices(&[(0.0, 0.0), (1.0, 0.5), (2.0, 2.0), (3.0, 2.5), (2.0, 3.0)]);
        let secs = sectionalize(7, &v, false);
        assert_eq!(secs.len(), 2);
        assert_eq!(secs[0].segments, 0..3);
        assert_eq!(secs[0].ring, 7);
        assert_eq!(secs[0].envelope, Rect::new((0.0, 0.0), (3.0, 2.5)));
        assert_eq!(secs[1].segments, 3..4);
    }

    #[test]
    fn long_runs_are_split() {
        let pts: Vec<_> = (0..25).map(|i| (i as f64, i as f64)).collect();
        let secs = sectionalize(0, &vertices(&pts), false);
        assert_eq!(secs.len(), 3);
        assert_eq!(secs[2].segments, 20..24);
    }

    #[test]
    fn pairs() {
        let a = sectionalize(0, &vertices(&[(0.0, 0.0), (2.0, 2.0)]), false);
        let b = sectionalize(
            0,
            &vertices(&[(5.0, 0.0), (6.0, 1.0), (7.0, 0.0), (1.0, 2.0), (1.0, 5.0)]),
            false,
        );
        assert_eq!(b.len(), 4);
        assert_eq!(overlapping_pairs(&a, &b), vec![(0, 2), (0, 3)]);

        let all = self_overlapping_pairs(&b);
        assert!(all.contains(&(0, 1)));
        assert!(all.contains(&(2, 3)));
        assert!(!all.contains(&(0, 3)));
        assert!(all.iter().all(|(i, j)| i <= j));
    }
}
