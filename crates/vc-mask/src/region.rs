use std::ops::Range;

use vc_core::Volume;

/// A drawn 2D polygon swept across a range of slices.
///
/// The polygon is given as `(x, y)` vertices on a slice plane; the region
/// covers every slice index in `slices`. Filling uses the even-odd rule on
/// voxel centers.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskRegion {
    polygon: Vec<(f32, f32)>,
    slices: Range<usize>,
}

impl MaskRegion {
    pub fn new(polygon: Vec<(f32, f32)>, slices: Range<usize>) -> Self {
        Self { polygon, slices }
    }

    pub fn slices(&self) -> Range<usize> {
        self.slices.clone()
    }

    pub(crate) fn rasterize_into(&self, dst: &mut Volume<u8>) {
        if self.polygon.len() < 3 {
            return;
        }

        let width = dst.width();
        let height = dst.height();
        let depth = dst.depth();
        let z_end = self.slices.end.min(depth);

        for y in 0..height {
            let yc = y as f32;
            let crossings = self.row_crossings(yc);
            // Consecutive crossing pairs delimit interior runs.
            for pair in crossings.chunks_exact(2) {
                let x0 = pair[0].ceil().max(0.0) as usize;
                let x1 = pair[1].floor().min((width.saturating_sub(1)) as f32);
                if x1 < 0.0 {
                    continue;
                }
                let x1 = x1 as usize;
                for x in x0..=x1.min(width.saturating_sub(1)) {
                    for z in self.slices.start..z_end {
                        *dst.get_mut(x, y, z).expect("in-bounds mask write") = 255;
                    }
                }
            }
        }
    }

    /// Sorted x coordinates where the polygon boundary crosses the scanline
    /// at `y`.
    fn row_crossings(&self, y: f32) -> Vec<f32> {
        let mut xs = Vec::new();
        let n = self.polygon.len();
        for i in 0..n {
            let (x0, y0) = self.polygon[i];
            let (x1, y1) = self.polygon[(i + 1) % n];
            // Half-open rule avoids double-counting shared vertices.
            if (y0 <= y && y1 > y) || (y1 <= y && y0 > y) {
                let t = (y - y0) / (y1 - y0);
                xs.push(x0 + t * (x1 - x0));
            }
        }
        xs.sort_by(|a, b| a.partial_cmp(b).expect("finite crossings"));
        xs
    }
}

#[cfg(test)]
mod tests {
    use vc_core::Volume;

    use super::MaskRegion;

    #[test]
    fn rectangle_fills_interior_on_selected_slices() {
        let region = MaskRegion::new(
            vec![(1.0, 1.0), (4.0, 1.0), (4.0, 4.0), (1.0, 4.0)],
            2..4,
        );
        let mut vol = Volume::new_fill(6, 6, 5, 0u8);
        region.rasterize_into(&mut vol);

        assert_eq!(vol.get(2, 2, 2), Some(&255));
        assert_eq!(vol.get(4, 3, 3), Some(&255));
        assert_eq!(vol.get(2, 2, 0), Some(&0));
        assert_eq!(vol.get(2, 2, 4), Some(&0));
        assert_eq!(vol.get(5, 2, 2), Some(&0));
        assert_eq!(vol.get(0, 0, 2), Some(&0));
    }

    #[test]
    fn triangle_covers_expected_voxels() {
        let region = MaskRegion::new(vec![(0.0, 0.0), (6.0, 0.0), (0.0, 6.0)], 0..1);
        let mut vol = Volume::new_fill(8, 8, 1, 0u8);
        region.rasterize_into(&mut vol);

        assert_eq!(vol.get(1, 1, 0), Some(&255));
        assert_eq!(vol.get(5, 5, 0), Some(&0));
    }

    #[test]
    fn degenerate_polygon_is_ignored() {
        let region = MaskRegion::new(vec![(1.0, 1.0), (2.0, 2.0)], 0..1);
        let mut vol = Volume::new_fill(4, 4, 1, 0u8);
        region.rasterize_into(&mut vol);
        assert!(vol.data().iter().all(|&v| v == 0));
    }
}
