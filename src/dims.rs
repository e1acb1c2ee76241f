//! Array shapes
//!
//! A [`Dimensions`] is an ordered sequence of per-axis extents. Extents are
//! `u64`, so a negative extent is unrepresentable by construction.

use serde::{Deserialize, Serialize};

/// The shape of a dataset or attribute: one non-negative extent per axis.
///
/// Rank is the number of axes. The element count is the product of all
/// extents; by convention a rank-0 shape has an element count of 0. Zero
/// extents are legal and also yield an element count of 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions(Vec<u64>);

impl Dimensions {
    /// Create an empty (rank-0) shape.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements: the product of all extents, 0 for rank 0.
    pub fn element_count(&self) -> u64 {
        if self.0.is_empty() {
            return 0;
        }
        self.0.iter().product()
    }

    /// The per-axis extents.
    pub fn extents(&self) -> &[u64] {
        &self.0
    }

    /// Append an axis.
    pub fn push(&mut self, extent: u64) {
        self.0.push(extent);
    }
}

impl From<Vec<u64>> for Dimensions {
    fn from(extents: Vec<u64>) -> Self {
        Self(extents)
    }
}

impl From<&[u64]> for Dimensions {
    fn from(extents: &[u64]) -> Self {
        Self(extents.to_vec())
    }
}

impl<const N: usize> From<[u64; N]> for Dimensions {
    fn from(extents: [u64; N]) -> Self {
        Self(extents.to_vec())
    }
}

impl std::ops::Index<usize> for Dimensions {
    type Output = u64;

    fn index(&self, axis: usize) -> &u64 {
        &self.0[axis]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_count_is_extent_product() {
        let dims = Dimensions::from([13, 3]);
        assert_eq!(dims.rank(), 2);
        assert_eq!(dims.element_count(), 39);
    }

    #[test]
    fn rank_zero_counts_zero_elements() {
        assert_eq!(Dimensions::new().element_count(), 0);
    }

    #[test]
    fn zero_extent_counts_zero_elements() {
        assert_eq!(Dimensions::from([4, 0, 2]).element_count(), 0);
    }
}
