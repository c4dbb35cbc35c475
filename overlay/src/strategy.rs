//! Numeric predicates, and the robustness policy that decides how they're evaluated.
//!
//! All orientation decisions in the overlay go through [`Strategy::side`].
//! Coordinates are first mapped into "robust space" by the policy: with
//! [`RobustnessPolicy::Rescale`] that is an integer grid covering both inputs,
//! otherwise it's the identity.

use robust::Coord;
use serde::{Deserialize, Serialize};

use crate::geom::{Point, Rect};

/// Which side of a directed line a point is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    /// Clockwise from the line.
    Right,
    /// On the line.
    Collinear,
    /// Counter-clockwise from the line.
    Left,
}

impl Side {
    fn from_determinant(det: f64) -> Side {
        if det > 0.0 {
            Side::Left
        } else if det < 0.0 {
            Side::Right
        } else {
            Side::Collinear
        }
    }

    /// The side you'd get by reversing the direction of the line.
    pub fn reverse(self) -> Side {
        match self {
            Side::Right => Side::Left,
            Side::Collinear => Side::Collinear,
            Side::Left => Side::Right,
        }
    }
}

/// How hard we try to get orientation predicates right.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobustnessPolicy {
    /// Snap all coordinates to an integer grid of about `10^7` cells across the
    /// joint extent of the inputs, and do the predicates exactly on the grid.
    #[default]
    Rescale,
    /// Keep the input coordinates, and evaluate predicates with adaptive-precision
    /// arithmetic.
    Exact,
    /// Plain `f64` determinants. Fast, but near-degenerate inputs can give
    /// inconsistent answers.
    None,
}

/// The number of grid cells along the longer side of the joint envelope.
const RESCALE_RANGE: f64 = 1.0e7;

/// The mapping from input coordinates to the integer grid.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Rescale {
    offset: Point,
    factor: f64,
}

impl Rescale {
    fn new(envelope: &Rect) -> Rescale {
        let extent = envelope.width().max(envelope.height());
        let factor = if extent > 0.0 {
            // Round down to a power of ten, so that decimal inputs stay decimal.
            10f64.powf((RESCALE_RANGE / extent).log10().floor())
        } else {
            1.0
        };
        Rescale {
            offset: envelope.min,
            factor,
        }
    }

    fn apply(&self, p: &Point) -> Point {
        Point::new(
            ((p.x - self.offset.x) * self.factor).round(),
            ((p.y - self.offset.y) * self.factor).round(),
        )
    }

    fn invert(&self, p: &Point) -> Point {
        Point::new(
            p.x / self.factor + self.offset.x,
            p.y / self.factor + self.offset.y,
        )
    }
}

/// A robustness policy, instantiated for a specific pair of inputs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Strategy {
    policy: RobustnessPolicy,
    rescale: Option<Rescale>,
}

impl Strategy {
    /// Creates a strategy for inputs lying inside `envelope`.
    ///
    /// The envelope only matters for [`RobustnessPolicy::Rescale`].
    pub fn new(policy: RobustnessPolicy, envelope: Option<Rect>) -> Strategy {
        let rescale = match (policy, envelope) {
            (RobustnessPolicy::Rescale, Some(env)) => Some(Rescale::new(&env)),
            (RobustnessPolicy::Rescale, None) => Some(Rescale {
                offset: Point::default(),
                factor: 1.0,
            }),
            _ => None,
        };
        Strategy { policy, rescale }
    }

    /// An exact strategy that works in input coordinates.
    pub fn exact() -> Strategy {
        Strategy::new(RobustnessPolicy::Exact, None)
    }

    /// The policy this strategy implements.
    pub fn policy(&self) -> RobustnessPolicy {
        self.policy
    }

    /// Is robust space an integer grid?
    pub fn is_rescaled(&self) -> bool {
        self.rescale.is_some()
    }

    /// Maps an input point into robust space.
    pub fn to_robust(&self, p: &Point) -> Point {
        match &self.rescale {
            Some(r) => r.apply(p),
            None => *p,
        }
    }

    /// Maps a robust point back into input coordinates.
    pub fn from_robust(&self, p: &Point) -> Point {
        match &self.rescale {
            Some(r) => r.invert(p),
            None => *p,
        }
    }

    /// Snaps a computed robust point onto the robust grid (if there is one).
    pub fn snap(&self, p: Point) -> Point {
        if self.rescale.is_some() {
            Point::new(p.x.round(), p.y.round())
        } else {
            p
        }
    }

    /// Which side of the directed line from `p` to `q` is the point `r` on?
    ///
    /// All three points are in robust space.
    pub fn side(&self, p: &Point, q: &Point, r: &Point) -> Side {
        match self.policy {
            // On the integer grid, orient2d's filter accepts the naive
            // determinant whenever it's exact, so this costs nothing extra.
            RobustnessPolicy::Rescale | RobustnessPolicy::Exact => {
                Side::from_determinant(robust::orient2d(coord(p), coord(q), coord(r)))
            }
            RobustnessPolicy::None => {
                let det = (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x);
                Side::from_determinant(det)
            }
        }
    }

    /// Do the vectors `a - origin` and `b - origin` point the same way?
    ///
    /// Only meaningful if `origin`, `a` and `b` are collinear.
    pub fn same_direction(&self, origin: &Point, a: &Point, b: &Point) -> bool {
        (a.x - origin.x) * (b.x - origin.x) + (a.y - origin.y) * (b.y - origin.y) > 0.0
    }
}

fn coord(p: &Point) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}
