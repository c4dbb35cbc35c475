//! The segment intersection engine.
//!
//! Given two segments, this finds where they meet (nowhere, at one point, or
//! along a collinear overlap with two endpoints) and how they meet. All the
//! decisions are made with side predicates in robust space; division only
//! happens when we need to produce a fraction or a point, and fractions are
//! computed exactly.

use malachite::Rational;
use serde::{Deserialize, Serialize};

use crate::{
    error::OverlayError,
    geom::{Point, Segment},
    num::SegmentRatio,
    strategy::{Side, Strategy},
};

/// How two segments meet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// They don't.
    None,
    /// They cross at a point in the interior of both.
    Crosses,
    /// An endpoint of one is an endpoint of the other.
    Touch,
    /// An endpoint of one lies in the interior of the other.
    TouchInterior,
    /// They overlap along a collinear stretch.
    Collinear,
    /// They are the same segment (possibly in opposite directions).
    Equal,
}

/// A segment endpoint, in input coordinates and in robust space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    /// Where the point is in the input.
    pub point: Point,
    /// Where the point is in robust space.
    pub robust: Point,
}

impl Vertex {
    /// A vertex whose robust coordinates are its input coordinates.
    pub fn exact(point: Point) -> Self {
        Vertex {
            point,
            robust: point,
        }
    }
}

/// A point where two segments meet.
#[derive(Clone, Debug, PartialEq)]
pub struct IntersectionPoint {
    /// The point, in input coordinates.
    pub point: Point,
    /// The point, in robust space.
    pub robust_point: Point,
    /// How far along each of the two segments the point is.
    pub fractions: [SegmentRatio; 2],
}

/// The result of intersecting two segments.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentIntersection {
    /// How the segments met.
    pub method: Method,
    /// Where they met, ordered along the first segment. There are no points
    /// if the method is `None`, two if it's `Collinear` or `Equal`, and one
    /// otherwise.
    pub points: Vec<IntersectionPoint>,
    /// For collinear overlaps, do the segments run in opposite directions?
    pub opposite: bool,
    /// The four side predicates: `p.0` and `p.1` relative to `q`, then `q.0`
    /// and `q.1` relative to `p`.
    pub sides: [Side; 4],
}

impl SegmentIntersection {
    fn none(sides: [Side; 4]) -> Self {
        SegmentIntersection {
            method: Method::None,
            points: Vec::new(),
            opposite: false,
            sides,
        }
    }
}

fn exact(x: f64) -> Rational {
    // Robust coordinates are finite, because inputs are checked when they're
    // prepared.
    Rational::try_from(x).unwrap_or_else(|_| Rational::from(0u32))
}

fn cross_exact(a: &Point, b: &Point, c: &Point, d: &Point) -> Rational {
    // (b - a) x (d - c)
    let abx = exact(b.x) - exact(a.x);
    let aby = exact(b.y) - exact(a.y);
    let cdx = exact(d.x) - exact(c.x);
    let cdy = exact(d.y) - exact(c.y);
    abx * cdy - aby * cdx
}

fn dot_exact(a: &Point, b: &Point, c: &Point, d: &Point) -> Rational {
    // (b - a) . (d - c)
    let abx = exact(b.x) - exact(a.x);
    let aby = exact(b.y) - exact(a.y);
    let cdx = exact(d.x) - exact(c.x);
    let cdy = exact(d.y) - exact(c.y);
    abx * cdx + aby * cdy
}

fn cross_approx(a: &Point, b: &Point, c: &Point, d: &Point) -> f64 {
    (b.x - a.x) * (d.y - c.y) - (b.y - a.y) * (d.x - c.x)
}

/// Picks the input point at a position that's known exactly, falling back to
/// interpolation.
fn place(p: [&Vertex; 2], q: [&Vertex; 2], t: &SegmentRatio, u: &SegmentRatio) -> Option<Vertex> {
    if t.is_zero() {
        Some(*p[0])
    } else if t.is_one() {
        Some(*p[1])
    } else if u.is_zero() {
        Some(*q[0])
    } else if u.is_one() {
        Some(*q[1])
    } else {
        None
    }
}

fn interpolate(a: &Vertex, b: &Vertex, t: &SegmentRatio, strategy: &Strategy) -> Vertex {
    Vertex {
        point: a.point.affine(&b.point, t.approximation()),
        robust: strategy.snap(a.robust.affine(&b.robust, t.approximation())),
    }
}

/// Intersects the segment `p` with the segment `q`.
///
/// Returns [`OverlayError::DegenerateSegment`] if either segment has zero
/// length in robust space.
pub fn intersect(
    p: [&Vertex; 2],
    q: [&Vertex; 2],
    strategy: &Strategy,
) -> Result<SegmentIntersection, OverlayError> {
    let [p0, p1] = p;
    let [q0, q1] = q;
    if p0.robust == p1.robust || q0.robust == q1.robust {
        return Err(OverlayError::DegenerateSegment);
    }

    let a0 = strategy.side(&q0.robust, &q1.robust, &p0.robust);
    let a1 = strategy.side(&q0.robust, &q1.robust, &p1.robust);
    let b0 = strategy.side(&p0.robust, &p1.robust, &q0.robust);
    let b1 = strategy.side(&p0.robust, &p1.robust, &q1.robust);
    let sides = [a0, a1, b0, b1];

    if (a0 == a1 && a0 != Side::Collinear) || (b0 == b1 && b0 != Side::Collinear) {
        return Ok(SegmentIntersection::none(sides));
    }

    if sides.iter().all(|s| *s == Side::Collinear) {
        return Ok(collinear(p, q, sides, strategy));
    }

    // The lines cross at a single point, and the side tests above guarantee it's on both segments.
    let denom_exact = cross_exact(&p0.robust, &p1.robust, &q0.robust, &q1.robust);
    let denom_approx = cross_approx(&p0.robust, &p1.robust, &q0.robust, &q1.robust);
    if denom_exact == 0 {
        // Only reachable with inexact predicates, which can disagree with the exact arithmetic.
        return Ok(SegmentIntersection::none(sides));
    }
    let t = if a0 == Side::Collinear {
        SegmentRatio::zero()
    } else if a1 == Side::Collinear {
        SegmentRatio::one()
    } else {
        let num = cross_exact(&p0.robust, &q0.robust, &q0.robust, &q1.robust);
        let num_approx = cross_approx(&p0.robust, &q0.robust, &q0.robust, &q1.robust);
        SegmentRatio::new(num / &denom_exact, num_approx / denom_approx)
    };
    let u = if b0 == Side::Collinear {
        SegmentRatio::zero()
    } else if b1 == Side::Collinear {
        SegmentRatio::one()
    } else {
        let num = cross_exact(&p0.robust, &q0.robust, &p0.robust, &p1.robust);
        let num_approx = cross_approx(&p0.robust, &q0.robust, &p0.robust, &p1.robust);
        SegmentRatio::new(num / &denom_exact, num_approx / denom_approx)
    };

    let method = match (t.on_end(), u.on_end()) {
        (true, true) => Method::Touch,
        (false, false) => Method::Crosses,
        _ => Method::TouchInterior,
    };

    let vertex = place(p, q, &t, &u).unwrap_or_else(|| interpolate(p0, p1, &t, strategy));
    Ok(SegmentIntersection {
        method,
        points: vec![IntersectionPoint {
            point: vertex.point,
            robust_point: vertex.robust,
            fractions: [t, u],
        }],
        opposite: false,
        sides,
    })
}

fn collinear(
    p: [&Vertex; 2],
    q: [&Vertex; 2],
    sides: [Side; 4],
    strategy: &Strategy,
) -> SegmentIntersection {
    let [p0, p1] = p;
    let [q0, q1] = q;

    // Project q's endpoints onto p, as fractions of p.
    let len = dot_exact(&p0.robust, &p1.robust, &p0.robust, &p1.robust);
    let tq0 = dot_exact(&p0.robust, &p1.robust, &p0.robust, &q0.robust) / &len;
    let tq1 = dot_exact(&p0.robust, &p1.robust, &p0.robust, &q1.robust) / &len;
    let opposite = tq1 < tq0;

    let zero = Rational::from(0u32);
    let one = Rational::from(1u32);
    let (lo_q, hi_q) = if opposite { (&tq1, &tq0) } else { (&tq0, &tq1) };
    let lo = if *lo_q > zero { lo_q.clone() } else { zero };
    let hi = if *hi_q < one { hi_q.clone() } else { one };
    if lo > hi {
        return SegmentIntersection::none(sides);
    }

    let len_approx = (p1.robust.x - p0.robust.x).powi(2) + (p1.robust.y - p0.robust.y).powi(2);
    let approx = |q: &Vertex| {
        ((p1.robust.x - p0.robust.x) * (q.robust.x - p0.robust.x)
            + (p1.robust.y - p0.robust.y) * (q.robust.y - p0.robust.y))
            / len_approx
    };
    let (tq0_approx, tq1_approx) = (approx(q0), approx(q1));

    // Converts a position along p into the corresponding position along q.
    let along_q = |t: &Rational| -> SegmentRatio {
        if t == &tq0 {
            SegmentRatio::zero()
        } else if t == &tq1 {
            SegmentRatio::one()
        } else {
            let span = &tq1 - &tq0;
            let t_approx = if t == &0 { 0.0 } else { 1.0 };
            let u_approx = (t_approx - tq0_approx) / (tq1_approx - tq0_approx);
            SegmentRatio::new((t - &tq0) / span, u_approx)
        }
    };
    let along_p = |t: &Rational| -> SegmentRatio {
        if t == &tq0 {
            SegmentRatio::new(t.clone(), tq0_approx)
        } else if t == &tq1 {
            SegmentRatio::new(t.clone(), tq1_approx)
        } else {
            SegmentRatio::new(t.clone(), if t == &0 { 0.0 } else { 1.0 })
        }
    };

    let make_point = |t: &Rational| {
        let ft = along_p(t);
        let fu = along_q(t);
        // Every end of the overlap is an endpoint of one of the segments.
        let vertex = place(p, q, &ft, &fu).unwrap_or_else(|| interpolate(p0, p1, &ft, strategy));
        IntersectionPoint {
            point: vertex.point,
            robust_point: vertex.robust,
            fractions: [ft, fu],
        }
    };

    if lo == hi {
        return SegmentIntersection {
            method: Method::Touch,
            points: vec![make_point(&lo)],
            opposite,
            sides,
        };
    }

    let method = if lo == 0 && hi == 1 && (*lo_q == 0 && *hi_q == 1) {
        Method::Equal
    } else {
        Method::Collinear
    };
    SegmentIntersection {
        method,
        points: vec![make_point(&lo), make_point(&hi)],
        opposite,
        sides,
    }
}

/// Intersects two segments given in input coordinates, with exact predicates.
pub fn segment_intersection(
    a: &Segment,
    b: &Segment,
) -> Result<SegmentIntersection, OverlayError> {
    let (a0, a1) = (Vertex::exact(a.start), Vertex::exact(a.end));
    let (b0, b1) = (Vertex::exact(b.start), Vertex::exact(b.end));
    intersect([&a0, &a1], [&b0, &b1], &Strategy::exact())
}
