//! Union, intersection and difference of areal geometries.
//!
//! The overlay runs in stages, each in its own module:
//!
//! 1. [`prepare`] validates the inputs, orients their rings and maps them
//!    into robust space.
//! 2. [`turns`] finds every place where the two boundaries meet.
//! 3. [`cluster`] groups turns that land on the same point.
//! 4. [`classify`] sorts the edges around every turn and cluster by angle, and
//!    uses that to decide which output each outgoing edge belongs to.
//! 5. [`enrich`] links each turn to the next one along each ring.
//! 6. [`touch`] (union only) drops point contacts that don't join their rings.
//! 7. [`biconnected`] labels the pieces of the turn graph, for tie-breaking.
//! 8. [`traverse`] walks the graph, producing the output rings.
//! 9. [`select_rings`] adds the rings that never meet the other geometry.
//! 10. [`assemble`] sorts the rings into polygons.

use serde::{Deserialize, Serialize};

use crate::{
    error::{OverlayError, Result},
    geom::{Geometry, MultiPolygon, Point},
    linear::overlay_linear,
    strategy::{RobustnessPolicy, Strategy},
};

pub(crate) mod assemble;
pub(crate) mod biconnected;
pub(crate) mod classify;
pub(crate) mod cluster;
pub(crate) mod enrich;
pub(crate) mod prepare;
pub(crate) mod select_rings;
pub(crate) mod side_sorter;
pub(crate) mod touch;
pub(crate) mod traverse;
pub mod turn_in_piece;
pub(crate) mod turns;

use turns::Operation;

/// Which boolean operation to compute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayType {
    /// Everything covered by either input.
    #[default]
    Union,
    /// Everything covered by both inputs.
    Intersection,
    /// Everything covered by the first input but not the second.
    Difference,
}

impl OverlayType {
    /// Does the output run along edges with this operation?
    ///
    /// Difference runs as an intersection with the (reversed) second input.
    pub(crate) fn selects(self, op: Operation) -> bool {
        match self {
            OverlayType::Union => matches!(op, Operation::Union | Operation::Continue),
            OverlayType::Intersection | OverlayType::Difference => {
                matches!(op, Operation::Intersection | Operation::Continue)
            }
        }
    }
}

/// Options for [`overlay`] and friends.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayOptions {
    /// The operation to compute.
    pub overlay_type: OverlayType,
    /// How to make the geometric predicates reliable.
    pub robustness: RobustnessPolicy,
    /// Turns whose robust points are within the same cell of a grid this
    /// size are treated as a single node. Zero means exact equality.
    pub cluster_tolerance: f64,
    /// Whether to drop output vertices that lie on a straight line between
    /// their neighbors.
    pub remove_collinear: bool,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        OverlayOptions {
            overlay_type: OverlayType::Union,
            robustness: RobustnessPolicy::Rescale,
            cluster_tolerance: 0.0,
            remove_collinear: true,
        }
    }
}

impl OverlayOptions {
    /// Returns these options, computing `overlay_type` instead.
    pub fn with_overlay_type(self, overlay_type: OverlayType) -> Self {
        OverlayOptions {
            overlay_type,
            ..self
        }
    }

    /// Returns these options, with a different robustness policy.
    pub fn with_robustness(self, robustness: RobustnessPolicy) -> Self {
        OverlayOptions { robustness, ..self }
    }

    /// Returns these options, with a different cluster tolerance.
    pub fn with_cluster_tolerance(self, cluster_tolerance: f64) -> Self {
        OverlayOptions {
            cluster_tolerance,
            ..self
        }
    }

    /// Returns these options, with collinear vertex removal switched on or off.
    pub fn with_remove_collinear(self, remove_collinear: bool) -> Self {
        OverlayOptions {
            remove_collinear,
            ..self
        }
    }
}

/// Computes the output rings of an overlay, without grouping them into
/// polygons.
///
/// Every ring is closed, with exteriors counter-clockwise and holes clockwise.
pub fn overlay_rings(
    a: &MultiPolygon,
    b: &MultiPolygon,
    options: &OverlayOptions,
) -> Result<Vec<Vec<Point>>> {
    let overlay = options.overlay_type;
    let span = tracing::debug_span!("overlay", ?overlay);
    let _guard = span.enter();

    prepare::check_finite(a)?;
    prepare::check_finite(b)?;
    let envelope = match (a.envelope(), b.envelope()) {
        (Some(ea), Some(eb)) => Some(ea.union(&eb)),
        (ea, eb) => ea.or(eb),
    };
    let strategy = Strategy::new(options.robustness, envelope);
    let reversed_sources = [false, overlay == OverlayType::Difference];
    let geometries = [
        prepare::prepare(a, 0, reversed_sources[0], &strategy)?,
        prepare::prepare(b, 1, reversed_sources[1], &strategy)?,
    ];

    let mut turns = turns::get_turns(&geometries, &strategy)?;
    let clusters = cluster::cluster_turns(&mut turns, options.cluster_tolerance);
    classify::classify_turns(&mut turns, &clusters, &geometries, reversed_sources, &strategy);
    enrich::enrich_turns(&mut turns, &clusters, &geometries, overlay);
    if overlay == OverlayType::Union && touch::handle_touch(&mut turns) > 0 {
        enrich::enrich_turns(&mut turns, &clusters, &geometries, overlay);
    }
    biconnected::detect_biconnected_components(&mut turns, &clusters)?;

    let mut rings = traverse::Traversal::new(
        &turns,
        &clusters,
        &geometries,
        overlay,
        reversed_sources,
        &strategy,
    )
    .traverse()?;
    rings.extend(select_rings::select_rings(&geometries, &turns, overlay, &strategy));
    Ok(rings)
}

/// Computes an overlay of two multi-polygons.
pub fn overlay_polygons(
    a: &MultiPolygon,
    b: &MultiPolygon,
    options: &OverlayOptions,
) -> Result<MultiPolygon> {
    let rings = overlay_rings(a, b, options)?;
    let ret = assemble::assemble(rings, options.remove_collinear);
    tracing::debug!(polygons = ret.0.len(), "assembled overlay");
    Ok(ret)
}

/// The union of two multi-polygons, with default options.
pub fn union(a: &MultiPolygon, b: &MultiPolygon) -> Result<MultiPolygon> {
    overlay_polygons(a, b, &OverlayOptions::default())
}

/// The intersection of two multi-polygons, with default options.
pub fn intersection(a: &MultiPolygon, b: &MultiPolygon) -> Result<MultiPolygon> {
    overlay_polygons(
        a,
        b,
        &OverlayOptions::default().with_overlay_type(OverlayType::Intersection),
    )
}

/// The difference `a - b` of two multi-polygons, with default options.
pub fn difference(a: &MultiPolygon, b: &MultiPolygon) -> Result<MultiPolygon> {
    overlay_polygons(
        a,
        b,
        &OverlayOptions::default().with_overlay_type(OverlayType::Difference),
    )
}

/// Computes an overlay of any two geometries for which it makes sense.
///
/// Two areal geometries (boxes, rings, polygons and multi-polygons) give a
/// multi-polygon. A linear geometry (segments, linestrings and
/// multi-linestrings) can be intersected with an areal one, in either order,
/// or have an areal one subtracted from it; that gives a multi-linestring.
/// Everything else is an [`OverlayError::UnsupportedCombination`].
pub fn overlay(a: &Geometry, b: &Geometry, options: &OverlayOptions) -> Result<Geometry> {
    let unsupported = || OverlayError::UnsupportedCombination {
        first: a.kind(),
        second: b.kind(),
    };
    let overlay = options.overlay_type;
    match (a.to_multi_polygon(), b.to_multi_polygon()) {
        (Some(a), Some(b)) => overlay_polygons(&a, &b, options).map(Geometry::MultiPolygon),
        (None, Some(area)) => {
            let lines = a.to_multi_line_string().ok_or_else(unsupported)?;
            if overlay == OverlayType::Union {
                return Err(unsupported());
            }
            overlay_linear(&lines, &area, overlay, options.robustness).map(Geometry::from)
        }
        (Some(area), None) => {
            let lines = b.to_multi_line_string().ok_or_else(unsupported)?;
            if overlay != OverlayType::Intersection {
                return Err(unsupported());
            }
            overlay_linear(&lines, &area, overlay, options.robustness).map(Geometry::from)
        }
        (None, None) => Err(unsupported()),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::geom::{tests::square, GeometryKind, LineString, Rect};

    #[test]
    fn options() {
        let opts = OverlayOptions::default()
            .with_overlay_type(OverlayType::Difference)
            .with_cluster_tolerance(2.0);
        assert_eq!(opts.overlay_type, OverlayType::Difference);
        assert_eq!(opts.robustness, RobustnessPolicy::Rescale);
        assert_eq!(opts.cluster_tolerance, 2.0);
        assert!(opts.remove_collinear);
    }

    #[test]
    fn selection() {
        assert!(OverlayType::Union.selects(Operation::Continue));
        assert!(OverlayType::Union.selects(Operation::Union));
        assert!(!OverlayType::Union.selects(Operation::Intersection));
        assert!(OverlayType::Difference.selects(Operation::Intersection));
        assert!(!OverlayType::Intersection.selects(Operation::Opposite));
        assert!(!OverlayType::Intersection.selects(Operation::Blocked));
    }

    #[test]
    fn geometry_dispatch() {
        let area: Geometry = Rect::new((0.0, 0.0), (2.0, 2.0)).into();
        let line: Geometry = [(1.0, -1.0), (1.0, 3.0)]
            .into_iter()
            .collect::<LineString>()
            .into();
        let intersection = OverlayOptions::default().with_overlay_type(OverlayType::Intersection);

        let g = overlay(&area, &square(1.0, 1.0, 3.0, 3.0).into(), &intersection).unwrap();
        assert_eq!(g.area(), 1.0);

        // Lines and areas intersect in either order.
        let expected = Geometry::MultiLineString(crate::geom::MultiLineString(vec![[
            (1.0, 0.0),
            (1.0, 2.0),
        ]
        .into_iter()
        .collect()]));
        assert_eq!(overlay(&line, &area, &intersection).unwrap(), expected);
        assert_eq!(overlay(&area, &line, &intersection).unwrap(), expected);

        assert_matches!(
            overlay(&area, &line, &OverlayOptions::default()),
            Err(OverlayError::UnsupportedCombination {
                first: GeometryKind::Rect,
                second: GeometryKind::LineString,
            })
        );
        assert_matches!(
            overlay(&line, &line, &intersection),
            Err(OverlayError::UnsupportedCombination { .. })
        );
    }
}
