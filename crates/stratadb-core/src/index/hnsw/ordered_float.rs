//! Ordered float wrapper for use in `BinaryHeap`.

use std::cmp::Ordering;

/// Wrapper giving `f32` a total order for heap use.
///
/// `f32::total_cmp` provides IEEE 754 total ordering, keeping
/// `Ord`/`Eq`/`PartialEq` consistent even for NaN, so a degenerate
/// distance can never corrupt the search heaps.
#[derive(Debug, Clone, Copy)]
pub(super) struct OrderedFloat(pub f32);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
