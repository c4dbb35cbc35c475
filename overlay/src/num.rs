//! Exact positions along segments.

use std::cmp::Ordering;

use malachite::Rational;

/// A position along a segment, as a fraction between 0 (the start) and 1 (the end).
///
/// The fraction is stored exactly, so that two positions on the same segment
/// can be compared without rounding. An `f64` approximation is kept alongside
/// it, for when we need to actually place a point.
///
/// Equality, hashing and ordering only look at the exact value.
#[derive(Clone)]
pub struct SegmentRatio {
    value: Rational,
    approximation: f64,
}

impl std::fmt::Debug for SegmentRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl SegmentRatio {
    /// Creates a ratio from its exact value and an approximation of it.
    ///
    /// Values off the segment are clamped onto it. The approximation is
    /// snapped to the endpoints when the exact value is one of them.
    pub fn new(value: Rational, approximation: f64) -> Self {
        let value = if value < 0 {
            Rational::from(0u32)
        } else if value > 1 {
            Rational::from(1u32)
        } else {
            value
        };
        let approximation = if value == 0 {
            0.0
        } else if value == 1 {
            1.0
        } else {
            approximation.clamp(0.0, 1.0)
        };
        SegmentRatio {
            value,
            approximation,
        }
    }

    /// The start of the segment.
    pub fn zero() -> Self {
        SegmentRatio {
            value: Rational::from(0u32),
            approximation: 0.0,
        }
    }

    /// The end of the segment.
    pub fn one() -> Self {
        SegmentRatio {
            value: Rational::from(1u32),
            approximation: 1.0,
        }
    }

    /// The exact value.
    pub fn value(&self) -> &Rational {
        &self.value
    }

    /// The approximate value.
    pub fn approximation(&self) -> f64 {
        self.approximation
    }

    /// Is this the start of the segment?
    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Is this the end of the segment?
    pub fn is_one(&self) -> bool {
        self.value == 1
    }

    /// Is this one of the two endpoints?
    pub fn on_end(&self) -> bool {
        self.is_zero() || self.is_one()
    }

    /// Is this strictly between the endpoints?
    pub fn in_interior(&self) -> bool {
        !self.on_end()
    }
}

impl PartialEq for SegmentRatio {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for SegmentRatio {}

impl std::hash::Hash for SegmentRatio {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl PartialOrd for SegmentRatio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SegmentRatio {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(num: u32, den: u32) -> SegmentRatio {
        SegmentRatio::new(
            Rational::from(num) / Rational::from(den),
            num as f64 / den as f64,
        )
    }

    #[test]
    fn ordering_is_exact() {
        // These two have the same f64 approximation.
        let a = SegmentRatio::new(Rational::from(1u32) / Rational::from(3u32), 0.5);
        let b = ratio(1, 3);
        assert_eq!(a, b);

        assert!(ratio(1, 3) < ratio(1, 2));
        assert!(SegmentRatio::zero() < ratio(1, 1000));
        assert_eq!(ratio(2, 2), SegmentRatio::one());
    }

    #[test]
    fn endpoints_snap() {
        let r = SegmentRatio::new(Rational::from(1u32), 0.9999999);
        assert_eq!(r.approximation(), 1.0);
        assert!(r.is_one());
        assert!(r.on_end());
        assert!(ratio(1, 2).in_interior());
        assert_eq!(
            SegmentRatio::new(Rational::from(1u32) / Rational::from(2u32), 1.5).approximation(),
            1.0
        );
    }
}
