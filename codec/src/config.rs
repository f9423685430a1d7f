//! Types for use as [crate::Read::Cfg].

use core::ops::{Bound, RangeBounds};

/// Configuration for limiting the range of a length.
///
/// Untrusted input declares its own lengths; a [RangeCfg] bounds them before anything is
/// allocated.
///
/// # Examples
///
/// ```
/// use pvss_codec::RangeCfg;
///
/// let cfg = RangeCfg::from(1..=128);
/// assert!(cfg.contains(128));
/// assert!(!cfg.contains(0));
/// assert!(!cfg.contains(129));
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RangeCfg {
    start: Bound<usize>,
    end: Bound<usize>,
}

impl RangeCfg {
    /// Creates a new `RangeCfg` from any type implementing `RangeBounds<usize>`.
    pub fn new(r: impl RangeBounds<usize>) -> Self {
        Self {
            start: r.start_bound().cloned(),
            end: r.end_bound().cloned(),
        }
    }

    /// Creates a `RangeCfg` that admits exactly one length.
    pub fn exact(len: usize) -> Self {
        Self::new(len..=len)
    }

    /// Returns whether `len` falls inside the configured range.
    pub fn contains(&self, len: usize) -> bool {
        (self.start, self.end).contains(&len)
    }
}

impl From<core::ops::Range<usize>> for RangeCfg {
    fn from(r: core::ops::Range<usize>) -> Self {
        Self::new(r)
    }
}

impl From<core::ops::RangeInclusive<usize>> for RangeCfg {
    fn from(r: core::ops::RangeInclusive<usize>) -> Self {
        Self::new(r)
    }
}

impl From<core::ops::RangeFrom<usize>> for RangeCfg {
    fn from(r: core::ops::RangeFrom<usize>) -> Self {
        Self::new(r)
    }
}

impl From<core::ops::RangeToInclusive<usize>> for RangeCfg {
    fn from(r: core::ops::RangeToInclusive<usize>) -> Self {
        Self::new(r)
    }
}

impl From<core::ops::RangeFull> for RangeCfg {
    fn from(_: core::ops::RangeFull) -> Self {
        Self::new(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let cfg = RangeCfg::from(2..5);
        assert!(!cfg.contains(1));
        assert!(cfg.contains(2));
        assert!(cfg.contains(4));
        assert!(!cfg.contains(5));

        let cfg = RangeCfg::from(..);
        assert!(cfg.contains(0));
        assert!(cfg.contains(usize::MAX));

        let cfg = RangeCfg::exact(7);
        assert!(cfg.contains(7));
        assert!(!cfg.contains(6));
    }
}
