//! The geometry model.
//!
//! These are plain structural types: the overlay engine reads them, and
//! writes its results back into them, but they carry no behavior beyond a
//! few measurements (area, envelope, orientation).

use serde::{Deserialize, Serialize};

/// A point in the plane.
///
/// Equality is exact coordinate equality.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// The horizontal coordinate.
    pub x: f64,
    /// The vertical coordinate.
    pub y: f64,
}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:?}, {:?})", self.x, self.y)
    }
}

impl Point {
    /// Creates a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Are both coordinates finite?
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// The point `(1 - t) * self + t * other`.
    ///
    /// Coordinates that `self` and `other` share come out exactly.
    pub fn affine(&self, other: &Point, t: f64) -> Point {
        Point {
            x: self.x + t * (other.x - self.x),
            y: self.y + t * (other.y - self.y),
        }
    }

    /// The midpoint between `self` and `other`.
    pub fn midpoint(&self, other: &Point) -> Point {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A straight line segment.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Where the segment starts.
    pub start: Point,
    /// Where the segment ends.
    pub end: Point,
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} -- {:?}", self.start, self.end)
    }
}

impl Segment {
    /// Creates a new segment.
    pub fn new(start: impl Into<Point>, end: impl Into<Point>) -> Self {
        Segment {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Is this segment just a single point?
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }
}

/// An axis-aligned box.
///
/// Boxes are closed: points on the boundary are contained.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// The corner with the smallest coordinates.
    pub min: Point,
    /// The corner with the largest coordinates.
    pub max: Point,
}

impl Rect {
    /// Creates a box from two opposite corners, in any order.
    pub fn new(a: impl Into<Point>, b: impl Into<Point>) -> Self {
        let (a, b) = (a.into(), b.into());
        Rect {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// The smallest box containing all the points, or `None` if there are no points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut ret = Rect {
            min: *first,
            max: *first,
        };
        for p in points {
            ret.expand_to(p);
        }
        Some(ret)
    }

    /// Grows this box so that it contains `p`.
    pub fn expand_to(&mut self, p: &Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// The smallest box containing both boxes.
    pub fn union(&self, other: &Rect) -> Rect {
        let mut ret = *self;
        ret.expand_to(&other.min);
        ret.expand_to(&other.max);
        ret
    }

    /// Do the two (closed) boxes share at least one point?
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Does this (closed) box contain `p`?
    pub fn contains(&self, p: &Point) -> bool {
        (self.min.x..=self.max.x).contains(&p.x) && (self.min.y..=self.max.y).contains(&p.y)
    }

    /// The width of the box.
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// The height of the box.
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// The four corners, counter-clockwise, as a closed ring.
    pub fn to_ring(&self) -> Ring {
        Ring(vec![
            self.min,
            Point::new(self.max.x, self.min.y),
            self.max,
            Point::new(self.min.x, self.max.y),
            self.min,
        ])
    }
}

/// The rotational direction of a ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Positive signed area.
    CounterClockwise,
    /// Negative signed area.
    Clockwise,
    /// Zero area: a ring whose points are all collinear.
    Degenerate,
}

/// A sequence of points, not necessarily closed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineString(pub Vec<Point>);

impl LineString {
    /// The total length of the linestring.
    pub fn length(&self) -> f64 {
        self.0
            .windows(2)
            .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
            .sum()
    }

    /// The segments of this linestring, in order.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.0.windows(2).map(|w| Segment {
            start: w[0],
            end: w[1],
        })
    }
}

impl<P: Into<Point>> FromIterator<P> for LineString {
    fn from_iter<T: IntoIterator<Item = P>>(iter: T) -> Self {
        LineString(iter.into_iter().map(Into::into).collect())
    }
}

/// A closed sequence of points bounding an area.
///
/// Rings may be given with or without a repeated closing point; both forms
/// describe the same ring. Rings produced by this crate are always closed
/// (the last point equals the first).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ring(pub Vec<Point>);

impl Ring {
    /// The points of the ring without the repeated closing point.
    pub fn open_points(&self) -> &[Point] {
        match self.0.as_slice() {
            [first, .., last] if first == last => &self.0[..self.0.len() - 1],
            pts => pts,
        }
    }

    /// Is the last point the same as the first?
    pub fn is_closed(&self) -> bool {
        self.0.len() > 1 && self.0.first() == self.0.last()
    }

    /// The shoelace area: positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        signed_area(self.open_points())
    }

    /// The (unsigned) enclosed area.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// The direction in which this ring winds.
    pub fn orientation(&self) -> Orientation {
        let area = self.signed_area();
        if area > 0.0 {
            Orientation::CounterClockwise
        } else if area < 0.0 {
            Orientation::Clockwise
        } else {
            Orientation::Degenerate
        }
    }

    /// The same ring, traversed in the other direction.
    pub fn reversed(&self) -> Ring {
        Ring(self.0.iter().rev().copied().collect())
    }

    /// The segments of this ring, including the closing one.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        let pts = self.open_points();
        pts.iter().enumerate().map(move |(i, p)| Segment {
            start: *p,
            end: pts[(i + 1) % pts.len()],
        })
    }

    /// The smallest box containing this ring.
    pub fn envelope(&self) -> Option<Rect> {
        Rect::from_points(&self.0)
    }
}

impl<P: Into<Point>> FromIterator<P> for Ring {
    fn from_iter<T: IntoIterator<Item = P>>(iter: T) -> Self {
        Ring(iter.into_iter().map(Into::into).collect())
    }
}

pub(crate) fn signed_area(pts: &[Point]) -> f64 {
    if pts.len() < 3 {
        return 0.0;
    }
    // Shift towards the origin to lose less precision on far-away rings.
    let o = pts[0];
    let mut sum = 0.0;
    for (i, p) in pts.iter().enumerate() {
        let q = &pts[(i + 1) % pts.len()];
        sum += (p.x - o.x) * (q.y - o.y) - (q.x - o.x) * (p.y - o.y);
    }
    sum / 2.0
}

/// A polygon: one exterior ring and any number of holes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// The outer boundary.
    pub exterior: Ring,
    /// The holes.
    pub interiors: Vec<Ring>,
}

impl Polygon {
    /// Creates a new polygon.
    pub fn new(exterior: Ring, interiors: Vec<Ring>) -> Self {
        Polygon {
            exterior,
            interiors,
        }
    }

    /// The area of the exterior minus the area of the holes.
    pub fn area(&self) -> f64 {
        self.exterior.area() - self.interiors.iter().map(Ring::area).sum::<f64>()
    }

    /// All rings of the polygon, exterior first.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> + '_ {
        std::iter::once(&self.exterior).chain(&self.interiors)
    }
}

/// A collection of points.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiPoint(pub Vec<Point>);

/// A collection of linestrings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiLineString(pub Vec<LineString>);

impl MultiLineString {
    /// The total length of all the linestrings.
    pub fn length(&self) -> f64 {
        self.0.iter().map(LineString::length).sum()
    }
}

/// A collection of polygons.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiPolygon(pub Vec<Polygon>);

impl MultiPolygon {
    /// The total area of all the polygons.
    pub fn area(&self) -> f64 {
        self.0.iter().map(Polygon::area).sum()
    }

    /// Are there no polygons at all?
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of rings, counting exteriors and holes.
    pub fn ring_count(&self) -> usize {
        self.0.iter().map(|p| 1 + p.interiors.len()).sum()
    }

    /// The smallest box containing every polygon.
    pub fn envelope(&self) -> Option<Rect> {
        Rect::from_points(self.0.iter().flat_map(|p| p.rings()).flat_map(|r| &r.0))
    }
}

impl From<Polygon> for MultiPolygon {
    fn from(p: Polygon) -> Self {
        MultiPolygon(vec![p])
    }
}

/// The kinds of geometry this crate knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    #[allow(missing_docs)]
    Point,
    #[allow(missing_docs)]
    Segment,
    #[allow(missing_docs)]
    Rect,
    #[allow(missing_docs)]
    LineString,
    #[allow(missing_docs)]
    Ring,
    #[allow(missing_docs)]
    Polygon,
    #[allow(missing_docs)]
    MultiPoint,
    #[allow(missing_docs)]
    MultiLineString,
    #[allow(missing_docs)]
    MultiPolygon,
}

/// Any geometry.
///
/// The set of kinds is closed, so algorithms that accept a `Geometry` just
/// match on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    #[allow(missing_docs)]
    Point(Point),
    #[allow(missing_docs)]
    Segment(Segment),
    #[allow(missing_docs)]
    Rect(Rect),
    #[allow(missing_docs)]
    LineString(LineString),
    #[allow(missing_docs)]
    Ring(Ring),
    #[allow(missing_docs)]
    Polygon(Polygon),
    #[allow(missing_docs)]
    MultiPoint(MultiPoint),
    #[allow(missing_docs)]
    MultiLineString(MultiLineString),
    #[allow(missing_docs)]
    MultiPolygon(MultiPolygon),
}

impl Geometry {
    /// What kind of geometry is this?
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::Segment(_) => GeometryKind::Segment,
            Geometry::Rect(_) => GeometryKind::Rect,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Ring(_) => GeometryKind::Ring,
            Geometry::Polygon(_) => GeometryKind::Polygon,
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
        }
    }

    /// Views an areal geometry (box, ring, polygon or multi-polygon) as a multi-polygon.
    ///
    /// Returns `None` for points and linear geometries.
    pub fn to_multi_polygon(&self) -> Option<MultiPolygon> {
        match self {
            Geometry::Rect(r) => Some(Polygon::new(r.to_ring(), Vec::new()).into()),
            Geometry::Ring(r) => Some(Polygon::new(r.clone(), Vec::new()).into()),
            Geometry::Polygon(p) => Some(p.clone().into()),
            Geometry::MultiPolygon(mp) => Some(mp.clone()),
            Geometry::Point(_)
            | Geometry::Segment(_)
            | Geometry::LineString(_)
            | Geometry::MultiPoint(_)
            | Geometry::MultiLineString(_) => None,
        }
    }

    /// Views a linear geometry (segment, linestring or multi-linestring) as a multi-linestring.
    ///
    /// Returns `None` for points and areal geometries.
    pub fn to_multi_line_string(&self) -> Option<MultiLineString> {
        match self {
            Geometry::Segment(s) => Some(MultiLineString(vec![LineString(vec![s.start, s.end])])),
            Geometry::LineString(l) => Some(MultiLineString(vec![l.clone()])),
            Geometry::MultiLineString(ml) => Some(ml.clone()),
            Geometry::Point(_)
            | Geometry::Rect(_)
            | Geometry::Ring(_)
            | Geometry::Polygon(_)
            | Geometry::MultiPoint(_)
            | Geometry::MultiPolygon(_) => None,
        }
    }

    /// The area covered by this geometry (zero for points and linear geometries).
    pub fn area(&self) -> f64 {
        self.to_multi_polygon().map_or(0.0, |mp| mp.area())
    }
}

impl From<Polygon> for Geometry {
    fn from(p: Polygon) -> Self {
        Geometry::Polygon(p)
    }
}

impl From<MultiPolygon> for Geometry {
    fn from(mp: MultiPolygon) -> Self {
        Geometry::MultiPolygon(mp)
    }
}

impl From<LineString> for Geometry {
    fn from(l: LineString) -> Self {
        Geometry::LineString(l)
    }
}

impl From<MultiLineString> for Geometry {
    fn from(ml: MultiLineString) -> Self {
        Geometry::MultiLineString(ml)
    }
}

impl From<Rect> for Geometry {
    fn from(r: Rect) -> Self {
        Geometry::Rect(r)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::new(Rect::new((x0, y0), (x1, y1)).to_ring(), Vec::new())
    }

    #[test]
    fn ring_closure_is_optional() {
        let open: Ring = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)].into_iter().collect();
        let closed: Ring = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]
            .into_iter()
            .collect();
        assert_eq!(open.open_points(), closed.open_points());
        assert_eq!(open.signed_area(), 0.5);
        assert_eq!(closed.signed_area(), 0.5);
        assert!(closed.is_closed());
        assert!(!open.is_closed());
    }

    #[test]
    fn orientation() {
        // Listed clockwise, the way WKT inputs often are.
        let cw: Ring = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)]
            .into_iter()
            .collect();
        assert_eq!(cw.orientation(), Orientation::Clockwise);
        assert_eq!(cw.reversed().orientation(), Orientation::CounterClockwise);

        let flat: Ring = [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)].into_iter().collect();
        assert_eq!(flat.orientation(), Orientation::Degenerate);
    }

    #[test]
    fn polygon_area_subtracts_holes() {
        let hole = Rect::new((4.0, 4.0), (6.0, 6.0)).to_ring().reversed();
        let p = Polygon::new(Rect::new((0.0, 0.0), (10.0, 10.0)).to_ring(), vec![hole]);
        assert_eq!(p.area(), 96.0);
    }

    #[test]
    fn rect_intersects_is_closed() {
        let a = Rect::new((0.0, 0.0), (1.0, 1.0));
        let b = Rect::new((1.0, 1.0), (2.0, 2.0));
        let c = Rect::new((1.5, 0.0), (2.0, 0.5));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains(&Point::new(1.0, 0.5)));
    }

    #[test]
    fn areal_views() {
        let g = Geometry::Rect(Rect::new((0.0, 0.0), (2.0, 3.0)));
        assert_eq!(g.area(), 6.0);
        assert!(g.to_multi_line_string().is_none());

        let l = Geometry::LineString([(0.0, 0.0), (3.0, 4.0)].into_iter().collect());
        assert_eq!(l.to_multi_line_string().map(|ml| ml.length()), Some(5.0));
        assert!(l.to_multi_polygon().is_none());
    }
}
