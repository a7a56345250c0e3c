//! Boolean inclusion masks for volume correlation.
//!
//! Voxels are treated as binary with threshold `> 0`. Stored values are `0`
//! or `255` in `u8`, matching the convention of the morphology helpers.
//!
//! A mask is built by sweeping drawn 2D polygon regions across a slice
//! range, taking the union of all regions, and optionally eroding by a voxel
//! margin so that subvolume templates stay inside the masked material.

mod morph;
mod region;

pub use morph::{dilate3x3x3_binary_u8, erode3x3x3_binary_u8};
pub use region::MaskRegion;

use vc_core::Volume;

/// Boolean inclusion volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    data: Volume<u8>,
}

impl Mask {
    /// An all-excluding mask with the given extents.
    pub fn empty(width: usize, height: usize, depth: usize) -> Self {
        Self {
            data: Volume::new_fill(width, height, depth, 0u8),
        }
    }

    /// Builds a mask from the union of drawn regions.
    pub fn from_regions(
        width: usize,
        height: usize,
        depth: usize,
        regions: &[MaskRegion],
    ) -> Self {
        let mut mask = Self::empty(width, height, depth);
        for region in regions {
            mask.add_region(region);
        }
        mask
    }

    /// Builds a mask from a per-voxel predicate. Intended for tests and
    /// programmatic callers that already have a segmentation.
    pub fn from_fn(
        width: usize,
        height: usize,
        depth: usize,
        mut include: impl FnMut(usize, usize, usize) -> bool,
    ) -> Self {
        let mut data = Volume::new_fill(width, height, depth, 0u8);
        for z in 0..depth {
            for y in 0..height {
                for x in 0..width {
                    if include(x, y, z) {
                        *data.get_mut(x, y, z).expect("in-bounds mask write") = 255;
                    }
                }
            }
        }
        Self { data }
    }

    /// Unions a drawn region into the mask.
    pub fn add_region(&mut self, region: &MaskRegion) {
        region.rasterize_into(&mut self.data);
    }

    pub fn width(&self) -> usize {
        self.data.width()
    }

    pub fn height(&self) -> usize {
        self.data.height()
    }

    pub fn depth(&self) -> usize {
        self.data.depth()
    }

    /// Whether the voxel participates in correlation. Out-of-extent queries
    /// are excluded.
    pub fn is_included(&self, x: usize, y: usize, z: usize) -> bool {
        self.data.get(x, y, z).is_some_and(|&v| v > 0)
    }

    pub fn included_count(&self) -> usize {
        self.data.data().iter().filter(|&&v| v > 0).count()
    }

    /// Erodes the mask by `margin` voxels (one 3x3x3 erosion pass per voxel
    /// of margin).
    pub fn eroded(&self, margin: usize) -> Self {
        let mut current = self.data.clone();
        for _ in 0..margin {
            current = erode3x3x3_binary_u8(&current.as_view());
        }
        Self { data: current }
    }

    /// Dilates the mask by `margin` voxels, the inverse edit of [`eroded`].
    ///
    /// [`eroded`]: Mask::eroded
    pub fn dilated(&self, margin: usize) -> Self {
        let mut current = self.data.clone();
        for _ in 0..margin {
            current = dilate3x3x3_binary_u8(&current.as_view());
        }
        Self { data: current }
    }
}

#[cfg(test)]
mod tests {
    use super::{Mask, MaskRegion};

    #[test]
    fn from_fn_and_inclusion_queries() {
        let mask = Mask::from_fn(4, 4, 4, |x, _, _| x < 2);
        assert!(mask.is_included(0, 3, 3));
        assert!(mask.is_included(1, 0, 0));
        assert!(!mask.is_included(2, 0, 0));
        assert!(!mask.is_included(9, 0, 0));
        assert_eq!(mask.included_count(), 2 * 4 * 4);
    }

    #[test]
    fn erosion_shrinks_by_margin() {
        // 6x6x6 solid block inside an 8x8x8 volume.
        let mask = Mask::from_fn(8, 8, 8, |x, y, z| {
            (1..7).contains(&x) && (1..7).contains(&y) && (1..7).contains(&z)
        });
        assert_eq!(mask.included_count(), 6 * 6 * 6);

        let eroded = mask.eroded(1);
        assert_eq!(eroded.included_count(), 4 * 4 * 4);
        assert!(eroded.is_included(3, 3, 3));
        assert!(!eroded.is_included(1, 1, 1));

        let twice = mask.eroded(2);
        assert_eq!(twice.included_count(), 2 * 2 * 2);
    }

    #[test]
    fn dilation_undoes_interior_erosion() {
        let mask = Mask::from_fn(10, 10, 10, |x, y, z| {
            (2..8).contains(&x) && (2..8).contains(&y) && (2..8).contains(&z)
        });
        let roundtrip = mask.eroded(1).dilated(1);
        assert_eq!(roundtrip.included_count(), mask.included_count());
        assert!(roundtrip.is_included(2, 2, 2));
        assert!(!roundtrip.is_included(1, 2, 2));
    }

    #[test]
    fn union_of_two_regions() {
        let a = MaskRegion::new(
            vec![(0.0, 0.0), (3.0, 0.0), (3.0, 3.0), (0.0, 3.0)],
            0..2,
        );
        let b = MaskRegion::new(
            vec![(4.0, 4.0), (7.0, 4.0), (7.0, 7.0), (4.0, 7.0)],
            1..3,
        );
        let mask = Mask::from_regions(8, 8, 4, &[a, b]);

        assert!(mask.is_included(1, 1, 0));
        assert!(mask.is_included(5, 5, 1));
        assert!(!mask.is_included(5, 5, 0));
        assert!(!mask.is_included(1, 1, 3));
    }
}
