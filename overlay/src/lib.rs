#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod error;
mod geom;
pub mod intersection;
mod linear;
mod num;
pub mod overlay;
mod sections;
pub mod strategy;
pub mod within;

pub use error::{OverlayError, Result};
pub use geom::{
    Geometry, GeometryKind, LineString, MultiLineString, MultiPoint, MultiPolygon, Orientation,
    Point, Polygon, Rect, Ring, Segment,
};
pub use linear::overlay_linear;
pub use num::SegmentRatio;
pub use overlay::{
    difference, intersection, overlay, overlay_polygons, overlay_rings,
    turn_in_piece::{turn_in_piece, PieceLocation},
    turns::{
        self_turns, ClusterIdx, EnrichmentInfo, Operation, RingId, SegmentId, Turn, TurnIdx,
        TurnOperation,
    },
    union, OverlayOptions, OverlayType,
};
pub use strategy::{RobustnessPolicy, Side, Strategy};
