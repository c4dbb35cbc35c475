use crate::geom::GeometryKind;

/// Things that can go wrong while computing an overlay.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OverlayError {
    /// The input geometry was malformed: a ring with fewer than three
    /// distinct points, or a ring with no area.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// At least one input coordinate was infinite or NaN.
    #[error("input coordinates must be finite")]
    NotFinite,

    /// A segment started and ended at the same point.
    #[error("zero-length segment")]
    DegenerateSegment,

    /// The overlay isn't defined for this pair of geometry kinds.
    #[error("cannot overlay {first:?} with {second:?}")]
    UnsupportedCombination {
        /// The kind of the first input.
        first: GeometryKind,
        /// The kind of the second input.
        second: GeometryKind,
    },

    /// The turn graph was internally inconsistent. This is a bug (or an input
    /// that is invalid in a way we didn't detect).
    #[error("inconsistent turn graph: {0}")]
    Consistency(String),
}

/// A `Result` specialized to [`OverlayError`].
pub type Result<T> = std::result::Result<T, OverlayError>;
